//! Curated catalog of foundational-literacy curriculum providers.
//!
//! The list is static and read-only; the add/edit school form offers
//! [`provider_names`] and narrows the product picker with
//! [`products_for_provider`].

/// A curriculum vendor and its product lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurriculumProvider {
    pub name: &'static str,
    pub products: &'static [&'static str],
}

/// Catch-all entry for vendors not in the list.
pub const OTHER_PROVIDER: &str = "Other";

/// All known providers, grouped by category.
pub static FOUNDATIONS_PROVIDERS: &[CurriculumProvider] = &[
    // Major Publishers
    CurriculumProvider {
        name: "Amplify",
        products: &["CKLA Skills", "CKLA Knowledge", "mCLASS"],
    },
    CurriculumProvider {
        name: "Houghton Mifflin Harcourt (HMH)",
        products: &["Into Reading", "Into Literature", "Saxon Phonics"],
    },
    CurriculumProvider {
        name: "McGraw Hill",
        products: &["Wonders", "Open Court Reading", "Reading Mastery", "SRA Early Interventions"],
    },
    CurriculumProvider {
        name: "Savvas Learning",
        products: &["myView Literacy", "ReadyGEN", "Benchmark Advance"],
    },
    CurriculumProvider {
        name: "Scholastic",
        products: &["Read 180", "System 44", "Phonics Inventory", "F.I.R.S.T."],
    },
    CurriculumProvider {
        name: "Curriculum Associates",
        products: &["Ready Reading", "i-Ready Classroom"],
    },
    CurriculumProvider {
        name: "Great Minds",
        products: &["Wit & Wisdom", "Geodes"],
    },
    // Phonics-Focused Publishers
    CurriculumProvider {
        name: "Wilson Language Training",
        products: &["Fundations", "Wilson Reading System", "Just Words"],
    },
    CurriculumProvider {
        name: "95 Percent Group",
        products: &["95 Phonics Core Program", "95 Phonics Lesson Library", "Phonics Chip Kit"],
    },
    CurriculumProvider {
        name: "Really Great Reading",
        products: &["Phonics Blitz", "Phonics Boost", "HD Word", "Countdown"],
    },
    CurriculumProvider {
        name: "Lexia Learning",
        products: &["Core5 Reading", "PowerUp Literacy", "Lexia LETRS"],
    },
    CurriculumProvider {
        name: "Voyager Sopris Learning",
        products: &["LETRS", "Voyager Passport", "Language! Live"],
    },
    CurriculumProvider {
        name: "SIPPS (Collaborative Classroom)",
        products: &["SIPPS Beginning", "SIPPS Extension", "SIPPS Plus", "SIPPS Challenge"],
    },
    CurriculumProvider {
        name: "University of Florida Literacy Institute",
        products: &["UFLI Foundations", "UFLI Virtual Teaching Resource Hub"],
    },
    CurriculumProvider {
        name: "Heggerty",
        products: &["Phonemic Awareness Curriculum", "Bridge to Reading"],
    },
    // Orton-Gillingham Based
    CurriculumProvider {
        name: "Orton-Gillingham Academy",
        products: &["Orton-Gillingham Approach"],
    },
    CurriculumProvider {
        name: "Institute for Multi-Sensory Education (IMSE)",
        products: &["IMSE Orton-Gillingham"],
    },
    CurriculumProvider {
        name: "Barton Reading & Spelling",
        products: &["Barton Reading & Spelling System"],
    },
    CurriculumProvider {
        name: "Logic of English",
        products: &["Foundations", "Essentials"],
    },
    CurriculumProvider {
        name: "All About Learning Press",
        products: &["All About Reading", "All About Spelling"],
    },
    CurriculumProvider {
        name: "Spalding Education International",
        products: &["The Writing Road to Reading"],
    },
    CurriculumProvider {
        name: "S.P.I.R.E.",
        products: &["S.P.I.R.E. Reading Program"],
    },
    // Structured Literacy
    CurriculumProvider {
        name: "Benchmark Education",
        products: &["Benchmark Phonics", "Benchmark Workshop"],
    },
    CurriculumProvider {
        name: "EL Education",
        products: &["EL Education K-5 Language Arts", "Skills Block"],
    },
    CurriculumProvider {
        name: "Core Knowledge Foundation",
        products: &["Core Knowledge Language Arts (CKLA)"],
    },
    CurriculumProvider {
        name: "Flyleaf Publishing",
        products: &["Flyleaf Emergent Readers", "Flyleaf Transitional Readers"],
    },
    CurriculumProvider {
        name: "Aligned Phonics",
        products: &["Aligned Phonics Curriculum"],
    },
    // Intervention Programs
    CurriculumProvider {
        name: "Reading Horizons",
        products: &["Reading Horizons Discovery", "Reading Horizons Elevate"],
    },
    CurriculumProvider {
        name: "Sonday System",
        products: &["Sonday System 1", "Sonday System 2"],
    },
    CurriculumProvider {
        name: "Equipped for Reading Success",
        products: &["Equipped for Reading Success Program"],
    },
    CurriculumProvider {
        name: "Lindamood-Bell",
        products: &["Seeing Stars", "Visualizing and Verbalizing", "Lips"],
    },
    CurriculumProvider {
        name: "Stern Center",
        products: &["Structured Literacy Intervention"],
    },
    // Supplemental Phonics
    CurriculumProvider {
        name: "Letterland",
        products: &["Letterland Phonics", "Fix-it Phonics"],
    },
    CurriculumProvider {
        name: "Jolly Learning",
        products: &["Jolly Phonics", "Jolly Grammar"],
    },
    CurriculumProvider {
        name: "Zoo-Phonics",
        products: &["Zoo-Phonics Curriculum"],
    },
    CurriculumProvider {
        name: "Explode The Code",
        products: &["Explode The Code"],
    },
    CurriculumProvider {
        name: "Primary Phonics",
        products: &["Primary Phonics"],
    },
    CurriculumProvider {
        name: "Secret Stories",
        products: &["Secret Stories Phonics"],
    },
    CurriculumProvider {
        name: "Phonics First",
        products: &["Phonics First Curriculum"],
    },
    CurriculumProvider {
        name: "Zaner-Bloser",
        products: &["Superkids Reading Program", "Handwriting"],
    },
    // Comprehensive ELA / Balanced Literacy
    CurriculumProvider {
        name: "Collaborative Classroom",
        products: &["Being a Reader", "Making Meaning", "Being a Writer"],
    },
    CurriculumProvider {
        name: "American Reading Company",
        products: &["ARC Core", "IRLA"],
    },
    CurriculumProvider {
        name: "Fountas & Pinnell",
        products: &["Leveled Literacy Intervention (LLI)", "Phonics, Spelling, and Word Study"],
    },
    CurriculumProvider {
        name: "Teachers College",
        products: &["Units of Study"],
    },
    CurriculumProvider {
        name: "Success for All Foundation",
        products: &["Success for All", "Reading Roots", "Reading Wings"],
    },
    CurriculumProvider {
        name: "Renaissance",
        products: &["Accelerated Reader", "myON Reader", "Star Assessments"],
    },
    CurriculumProvider {
        name: "Imagine Learning",
        products: &["Imagine Language & Literacy", "Imagine Reading"],
    },
    // State/Open Resources
    CurriculumProvider {
        name: "Louisiana Department of Education",
        products: &["ELA Guidebooks"],
    },
    CurriculumProvider {
        name: "Texas Education Agency",
        products: &["Texas Home Learning"],
    },
    CurriculumProvider {
        name: "OpenUp Resources",
        products: &["EL Education Curriculum"],
    },
    CurriculumProvider {
        name: "Bookworms Reading and Writing",
        products: &["Bookworms K-5"],
    },
    CurriculumProvider {
        name: "FCRR (Florida Center for Reading Research)",
        products: &["FCRR Resources"],
    },
    // Other
    CurriculumProvider {
        name: "Other",
        products: &[],
    },
];

/// Provider names in catalog order.
#[must_use]
pub fn provider_names() -> Vec<&'static str> {
    FOUNDATIONS_PROVIDERS.iter().map(|p| p.name).collect()
}

/// Product lines for a provider, matched by exact name.
///
/// Unknown providers (and [`OTHER_PROVIDER`]) have no products.
#[must_use]
pub fn products_for_provider(name: &str) -> &'static [&'static str] {
    FOUNDATIONS_PROVIDERS
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.products)
        .unwrap_or_default()
}
