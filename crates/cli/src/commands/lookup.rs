//! Lookups backing the add-school form.
//!
//! # Usage
//!
//! ```bash
//! census providers
//! census providers "Wilson Language Training"
//! census states
//! census districts NJ
//! census schools 3400001
//! ```

use literacy_census_client::guard::Route;
use literacy_census_client::{AppError, AppState, Result};
use literacy_census_core::catalog::OTHER_PROVIDER;
use literacy_census_core::{products_for_provider, provider_names};

use super::enter;

/// List curriculum providers, or the products of one.
#[allow(clippy::print_stdout)]
pub fn providers(state: &AppState, name: Option<&str>) -> Result<()> {
    enter(state, &Route::AddSchool)?;

    let Some(name) = name else {
        for provider in provider_names() {
            println!("{provider}");
        }
        return Ok(());
    };

    if !provider_names().contains(&name) {
        return Err(AppError::NotFound(format!("provider {name:?}")));
    }
    let products = products_for_provider(name);
    if products.is_empty() {
        if name == OTHER_PROVIDER {
            println!("(enter the product name with --product)");
        } else {
            println!("(no products listed)");
        }
    }
    for product in products {
        println!("{product}");
    }
    Ok(())
}

/// List states in the directory.
#[allow(clippy::print_stdout)]
pub async fn states(state: &AppState) -> Result<()> {
    enter(state, &Route::AddSchool)?;

    for abbr in state.directory().states().await? {
        println!("{abbr}");
    }
    Ok(())
}

/// List districts in a state.
#[allow(clippy::print_stdout)]
pub async fn districts(state: &AppState, abbr: &str) -> Result<()> {
    enter(state, &Route::AddSchool)?;

    let districts = state.directory().districts(&abbr.to_uppercase()).await?;
    if districts.is_empty() {
        println!("No districts found for {abbr}.");
    }
    for district in districts {
        println!("{:<10} {}", district.id, district.name);
    }
    Ok(())
}

/// List schools in a district.
#[allow(clippy::print_stdout)]
pub async fn schools(state: &AppState, leaid: &str) -> Result<()> {
    enter(state, &Route::AddSchool)?;

    let schools = state.directory().schools(leaid).await?;
    if schools.is_empty() {
        println!("No schools found for district {leaid}.");
    }
    for school in schools {
        println!("{:<14} {}", school.id, school.name);
    }
    Ok(())
}
