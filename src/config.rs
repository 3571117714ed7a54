use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

const CODE_BASE_URL: &str = "https://recipes.code.dev-guardianapis.com";
const PROD_BASE_URL: &str = "https://recipes.guardianapis.com";

/// Deployment environment. Parsed case-insensitively; unknown names are kept
/// so the function name can still be formed, but they have no read URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Code,
    Prod,
    Other(String),
}

impl FromStr for Stage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "CODE" => Stage::Code,
            "PROD" => Stage::Prod,
            _ => Stage::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Code => f.write_str("CODE"),
            Stage::Prod => f.write_str("PROD"),
            Stage::Other(s) => f.write_str(s),
        }
    }
}

impl Stage {
    pub fn function_name(&self) -> String {
        format!("update-density-data-{self}")
    }

    /// Empty for an unknown stage.
    pub fn base_url(&self) -> &'static str {
        match self {
            Stage::Code => CODE_BASE_URL,
            Stage::Prod => PROD_BASE_URL,
            Stage::Other(_) => "",
        }
    }

    /// Public location of a published revision, or of `latest`.
    pub fn document_url(&self, revision: &str) -> String {
        format!("{}/densities/{revision}/densities.json", self.base_url())
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub stage: Stage,
    pub region: String,
}

impl Settings {
    /// Warns once here about an unknown stage; URL building stays quiet.
    pub fn new(stage: Stage, region: String) -> Self {
        if let Stage::Other(name) = &stage {
            warn!("STAGE should be CODE or PROD, got {name:?}");
        }
        Self { stage, region }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn stage_parses_case_insensitively() {
        assert_eq!("code".parse::<Stage>().unwrap(), Stage::Code);
        assert_eq!("Prod".parse::<Stage>().unwrap(), Stage::Prod);
        assert_eq!(
            "dev".parse::<Stage>().unwrap(),
            Stage::Other("dev".to_string())
        );
    }

    #[test]
    fn function_name_uses_canonical_stage() {
        assert_eq!(
            "code".parse::<Stage>().unwrap().function_name(),
            "update-density-data-CODE"
        );
        assert_eq!(Stage::Prod.function_name(), "update-density-data-PROD");
    }

    #[test]
    fn document_urls_per_stage() {
        assert_eq!(
            Stage::Code.document_url("latest"),
            "https://recipes.code.dev-guardianapis.com/densities/latest/densities.json"
        );
        assert_eq!(
            Stage::Prod.document_url("2025-10-01T09:30:00Z"),
            "https://recipes.guardianapis.com/densities/2025-10-01T09:30:00Z/densities.json"
        );
    }

    #[test]
    #[traced_test]
    fn unknown_stage_warns_once_when_settings_are_built() {
        let settings = Settings::new(Stage::Other("QA".into()), "eu-west-1".into());
        for revision in ["latest", "2025-10-01T09:30:00Z", "2025-09-01T12:00:00Z"] {
            settings.stage.document_url(revision);
        }
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|l| l.contains("STAGE should be CODE or PROD"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one stage warning, got {n}")),
            }
        });
    }

    #[test]
    #[traced_test]
    fn known_stage_does_not_warn() {
        Settings::new(Stage::Prod, "eu-west-1".into());
        assert!(!logs_contain("STAGE should be"));
    }

    #[test]
    fn unknown_stage_has_no_base_url() {
        let stage = Stage::Other("QA".into());
        assert_eq!(stage.base_url(), "");
        assert_eq!(stage.document_url("latest"), "/densities/latest/densities.json");
    }
}
