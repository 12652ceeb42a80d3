//! Final license resolution
//!
//! The one place that decides which license governs an artifact:
//!
//! ```text
//!   Configured  >  Overridden  >  Declared AND Observed
//! ```
//!
//! Report writers must go through [`final_license`] rather than reading the
//! license facts themselves.

use super::LicenseInformation;
use crate::artifact::{
    Artifact, ConfiguredLicenseInformation, DeclaredLicenseInformation, ObservedLicenseInformation,
    OverriddenLicenseInformation,
};

/// The license that governs `artifact`
pub fn final_license(artifact: &Artifact) -> LicenseInformation {
    if let Some(configured) = artifact.get::<ConfiguredLicenseInformation>() {
        return configured.license().clone();
    }
    if let Some(overridden) = artifact.get::<OverriddenLicenseInformation>() {
        return overridden.license().clone();
    }
    let declared = artifact
        .get::<DeclaredLicenseInformation>()
        .map(|d| d.license().clone())
        .unwrap_or_default();
    let observed = artifact
        .get::<ObservedLicenseInformation>()
        .map(|o| o.license().clone())
        .unwrap_or_default();
    combine(declared, observed)
}

/// Join two findings with AND; an empty side yields the other unchanged
pub fn combine(a: LicenseInformation, b: LicenseInformation) -> LicenseInformation {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }
    a.and(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::{spdx, License, LicenseOperator};

    fn lic(id: &str) -> LicenseInformation {
        License::new(id).into()
    }

    #[test]
    fn test_configured_beats_overridden() {
        let mut artifact = Artifact::new();
        artifact
            .add_fact(OverriddenLicenseInformation(lic("EPL-2.0")))
            .add_fact(ConfiguredLicenseInformation(lic("MIT")))
            .add_fact(DeclaredLicenseInformation(lic("GPL-3.0-only")));
        assert_eq!(final_license(&artifact).evaluate(), "MIT");
    }

    #[test]
    fn test_overridden_beats_declared_and_observed() {
        let mut artifact = Artifact::new();
        artifact
            .add_fact(DeclaredLicenseInformation(lic("Apache-2.0")))
            .add_fact(ObservedLicenseInformation(lic("MIT")))
            .add_fact(OverriddenLicenseInformation(lic("EPL-2.0")));
        assert_eq!(final_license(&artifact), lic("EPL-2.0"));
    }

    #[test]
    fn test_empty_configured_is_skipped() {
        let mut artifact = Artifact::new();
        artifact
            .add_fact(ConfiguredLicenseInformation::default())
            .add_fact(OverriddenLicenseInformation(lic("EPL-2.0")));
        assert_eq!(final_license(&artifact), lic("EPL-2.0"));
    }

    #[test]
    fn test_declared_and_observed_are_anded() {
        let mut artifact = Artifact::new();
        artifact
            .add_fact(DeclaredLicenseInformation(lic("Apache-2.0")))
            .add_fact(ObservedLicenseInformation(spdx::parse("EPL-2.0 AND Apache-2.0").unwrap()));
        let resolved = final_license(&artifact);
        assert_eq!(resolved.operator(), Some(LicenseOperator::And));

        let licenses = resolved.licenses();
        assert_eq!(licenses.len(), 2);
        assert_eq!(licenses.iter().filter(|l| l.id == "Apache-2.0").count(), 1);
    }

    #[test]
    fn test_declared_only_is_unchanged() {
        let declared = spdx::parse("MIT OR Apache-2.0").unwrap();
        let mut artifact = Artifact::new();
        artifact
            .add_fact(DeclaredLicenseInformation(declared.clone()))
            .add_fact(ObservedLicenseInformation::default());
        assert_eq!(final_license(&artifact), declared);
    }

    #[test]
    fn test_nothing_known_is_empty() {
        assert!(final_license(&Artifact::new()).is_empty());
    }

    #[test]
    fn test_combine_absorbs_empty() {
        assert_eq!(combine(lic("MIT"), LicenseInformation::Empty), lic("MIT"));
        assert_eq!(combine(LicenseInformation::Empty, lic("MIT")), lic("MIT"));
        assert_eq!(
            combine(LicenseInformation::Empty, LicenseInformation::Empty),
            LicenseInformation::Empty
        );
    }
}
