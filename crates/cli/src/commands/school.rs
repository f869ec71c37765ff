//! School curriculum records.
//!
//! # Usage
//!
//! ```bash
//! census school list
//! census school add --state NJ --district 3400001 --school 340000100123 \
//!     --provider "Wilson Language Training" --product Fundations --year 2023
//! census school edit <ID> --product "Wilson Reading System" --clear-year
//! census school show <ID>
//! census school delete <ID>
//! ```
//!
//! District and school names are resolved through the schools directory, so
//! only ids need to be given.

use literacy_census_client::guard::Route;
use literacy_census_client::{AppError, AppState, Result};
use literacy_census_core::{
    SchoolDraft, SchoolId, SchoolRecord, products_for_provider, provider_names,
};

use super::{enter, format_time, signed_in};

/// Input of `school add`.
#[derive(Debug, Clone)]
pub struct AddForm {
    pub state: String,
    pub district_id: String,
    pub school_id: String,
    pub provider: String,
    pub product: String,
    pub year: Option<u16>,
    pub notes: Option<String>,
}

/// Fields `school edit` can change.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SchoolChanges {
    /// New curriculum provider
    #[arg(long)]
    pub provider: Option<String>,
    /// New product line
    #[arg(long)]
    pub product: Option<String>,
    /// New adoption year
    #[arg(long, conflicts_with = "clear_year")]
    pub year: Option<u16>,
    /// Remove the adoption year
    #[arg(long)]
    pub clear_year: bool,
    /// New notes
    #[arg(long, conflicts_with = "clear_notes")]
    pub notes: Option<String>,
    /// Remove the notes
    #[arg(long)]
    pub clear_notes: bool,
}

impl SchoolChanges {
    fn apply(self, mut draft: SchoolDraft) -> SchoolDraft {
        if let Some(provider) = self.provider {
            draft.provider_name = provider;
        }
        if let Some(product) = self.product {
            draft.product_name = product;
        }
        if self.clear_year {
            draft.adoption_year = None;
        } else if self.year.is_some() {
            draft.adoption_year = self.year;
        }
        if self.clear_notes {
            draft.notes = None;
        } else if self.notes.is_some() {
            draft.notes = self.notes;
        }
        draft
    }
}

/// Provider must come from the catalog; so must the product, unless the
/// provider lists none (free text, as for "Other").
fn check_curriculum(provider: &str, product: &str) -> Result<()> {
    if !provider_names().contains(&provider) {
        return Err(AppError::BadRequest(format!(
            "Unknown provider {provider:?}; run `census providers` for the list"
        )));
    }
    if product.trim().is_empty() {
        return Err(AppError::BadRequest("Product is required".to_string()));
    }

    let products = products_for_provider(provider);
    if !products.is_empty() && !products.contains(&product) {
        return Err(AppError::BadRequest(format!(
            "{provider:?} has no product {product:?}; expected one of: {}",
            products.join(", ")
        )));
    }
    Ok(())
}

/// List every record.
#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState) -> Result<()> {
    enter(state, &Route::Home)?;

    let records = state.schools().list().await?;
    if records.is_empty() {
        println!("No schools recorded yet.");
        return Ok(());
    }

    for record in &records {
        let draft = &record.draft;
        println!(
            "{}  {}  {} ({})  {} / {}  {}",
            record.id,
            draft.state,
            draft.school_name,
            draft.district_name,
            draft.provider_name,
            draft.product_name,
            draft
                .adoption_year
                .map_or_else(|| "-".to_string(), |y| y.to_string()),
        );
    }
    println!("\n{} school(s)", records.len());
    Ok(())
}

/// Show one record.
pub async fn show(state: &AppState, id: &str) -> Result<()> {
    enter(state, &Route::Home)?;

    let record = fetch(state, &SchoolId::new(id)).await?;
    print_record(&record);
    Ok(())
}

/// Add a record.
#[allow(clippy::print_stdout)]
pub async fn add(state: &AppState, form: AddForm) -> Result<()> {
    let actor = signed_in(state, &Route::AddSchool)?;
    check_curriculum(&form.provider, &form.product)?;

    let abbr = form.state.trim().to_uppercase();
    let district = state
        .directory()
        .districts(&abbr)
        .await?
        .into_iter()
        .find(|d| d.id == form.district_id)
        .ok_or_else(|| AppError::NotFound(format!("district {} in {abbr}", form.district_id)))?;
    let school = state
        .directory()
        .schools(&district.id)
        .await?
        .into_iter()
        .find(|s| s.id == form.school_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("school {} in district {}", form.school_id, district.id))
        })?;

    let draft = SchoolDraft {
        state: abbr,
        district_id: district.id,
        district_name: district.name,
        school_id: school.id,
        school_name: school.name,
        provider_name: form.provider,
        product_name: form.product,
        adoption_year: form.year,
        notes: form.notes.filter(|n| !n.trim().is_empty()),
    };

    let id = state.schools().create(&actor, &draft).await?;
    println!("Added {} ({id}).", draft.school_name);
    Ok(())
}

/// Edit the curriculum fields of a record.
#[allow(clippy::print_stdout)]
pub async fn edit(state: &AppState, id: &str, changes: SchoolChanges) -> Result<()> {
    let id = SchoolId::new(id);
    let actor = signed_in(state, &Route::EditSchool(id.clone()))?;

    let record = fetch(state, &id).await?;
    let draft = changes.apply(record.draft);
    check_curriculum(&draft.provider_name, &draft.product_name)?;

    state.schools().update(&actor, &id, &draft).await?;
    println!("Updated {} ({id}).", draft.school_name);
    Ok(())
}

/// Delete a record.
#[allow(clippy::print_stdout)]
pub async fn delete(state: &AppState, id: &str) -> Result<()> {
    let id = SchoolId::new(id);
    let actor = signed_in(state, &Route::EditSchool(id.clone()))?;

    state.schools().delete(&actor, &id).await?;
    println!("Deleted {id}.");
    Ok(())
}

async fn fetch(state: &AppState, id: &SchoolId) -> Result<SchoolRecord> {
    state
        .schools()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("school {id}")))
}

#[allow(clippy::print_stdout)]
fn print_record(record: &SchoolRecord) {
    let draft = &record.draft;
    println!("ID:        {}", record.id);
    println!("School:    {} ({})", draft.school_name, draft.school_id);
    println!("District:  {} ({})", draft.district_name, draft.district_id);
    println!("State:     {}", draft.state);
    println!("Provider:  {}", draft.provider_name);
    println!("Product:   {}", draft.product_name);
    println!(
        "Adopted:   {}",
        draft
            .adoption_year
            .map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    println!("Notes:     {}", draft.notes.as_deref().unwrap_or("-"));
    println!(
        "Added by:  {} on {}",
        record
            .created_by_email
            .as_deref()
            .unwrap_or_else(|| record.created_by.as_str()),
        format_time(record.created_at)
    );
    if let Some(updated_by) = &record.updated_by {
        println!(
            "Edited by: {updated_by} on {}",
            format_time(record.updated_at)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SchoolDraft {
        SchoolDraft {
            state: "NJ".to_string(),
            district_id: "3400001".to_string(),
            district_name: "Absecon City".to_string(),
            school_id: "340000100123".to_string(),
            school_name: "H. Ashton Marsh".to_string(),
            provider_name: "Wilson Language Training".to_string(),
            product_name: "Fundations".to_string(),
            adoption_year: Some(2021),
            notes: Some("K-2 only".to_string()),
        }
    }

    #[test]
    fn test_catalog_products_accepted() {
        assert!(check_curriculum("Wilson Language Training", "Fundations").is_ok());
    }

    #[test]
    fn test_product_must_match_provider() {
        assert!(matches!(
            check_curriculum("Wilson Language Training", "Bookworms K-5"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_other_takes_free_text() {
        assert!(check_curriculum("Other", "Homegrown phonics kit").is_ok());
        assert!(check_curriculum("Other", "  ").is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(check_curriculum("No Such Vendor", "Anything").is_err());
    }

    #[test]
    fn test_changes_keep_unset_fields() {
        let changes = SchoolChanges {
            product: Some("Just Words".to_string()),
            ..SchoolChanges::default()
        };
        let updated = changes.apply(draft());

        assert_eq!(updated.product_name, "Just Words");
        assert_eq!(updated.provider_name, "Wilson Language Training");
        assert_eq!(updated.adoption_year, Some(2021));
        assert_eq!(updated.notes.as_deref(), Some("K-2 only"));
    }

    #[test]
    fn test_changes_clear_optional_fields() {
        let changes = SchoolChanges {
            clear_year: true,
            clear_notes: true,
            ..SchoolChanges::default()
        };
        let updated = changes.apply(draft());

        assert_eq!(updated.adoption_year, None);
        assert_eq!(updated.notes, None);
    }
}
