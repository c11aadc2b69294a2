// ABOUTME: Integration tests for validated names, deployment addresses and release references.
// ABOUTME: Tests parsing, validation and rendering rules.

use escape::types::*;

mod name_tests {
    use super::*;

    #[test]
    fn valid_names_per_kind() {
        for kind in [NameKind::Project, NameKind::Environment, NameKind::Stage] {
            assert!(kind.validate("my-project_2").is_ok(), "{kind}");
        }
        assert!(NameKind::Deployment.validate("2fast").is_ok());
        assert!(NameKind::Deployment.validate("_/archive").is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(
            NameKind::Project.validate(""),
            Err(NameError::Empty {
                kind: NameKind::Project
            })
        );
    }

    #[test]
    fn name_must_start_with_letter() {
        match NameKind::Environment.validate("1prod") {
            Err(NameError::InvalidStart { found, .. }) => assert_eq!(found, '1'),
            other => panic!("expected InvalidStart, got {other:?}"),
        }
        assert!(NameKind::Stage.validate("_deploy").is_err());
    }

    #[test]
    fn invalid_characters_are_reported() {
        match NameKind::Project.validate("my project") {
            Err(NameError::InvalidChar { found, name, .. }) => {
                assert_eq!(found, ' ');
                assert_eq!(name, "my project");
            }
            other => panic!("expected InvalidChar, got {other:?}"),
        }
        assert!(NameKind::Stage.validate("de.ploy").is_err());
        assert!(NameKind::Deployment.validate("web:db").is_err());
    }

    #[test]
    fn overly_long_names_are_rejected() {
        let long = "a".repeat(129);
        assert_eq!(
            NameKind::Deployment.validate(&long),
            Err(NameError::TooLong {
                kind: NameKind::Deployment
            })
        );
        assert!(NameKind::Deployment.validate(&"a".repeat(128)).is_ok());
    }
}

mod address_tests {
    use super::*;

    #[test]
    fn root_address() {
        let addr = DeploymentAddress::root("web");
        assert!(addr.is_root());
        assert_eq!(addr.root_name(), "web");
        assert_eq!(addr.name(), "web");
        assert_eq!(addr.depth(), 0);
        assert_eq!(addr.to_string(), "web");
    }

    #[test]
    fn nested_address_keeps_stages() {
        let addr = DeploymentAddress::root("web")
            .child("deploy", "_/db")
            .child("build", "_/cache");
        assert!(!addr.is_root());
        assert_eq!(addr.root_name(), "web");
        assert_eq!(addr.to_string(), "web:_/db:_/cache");

        let hops: Vec<(&str, &str)> = addr.hops().collect();
        assert_eq!(hops, vec![("deploy", "_/db"), ("build", "_/cache")]);

        let (parent, stage) = addr.parent().unwrap();
        assert_eq!(stage, "build");
        assert_eq!(parent.to_string(), "web:_/db");
    }

    #[test]
    fn same_names_under_different_stages_differ() {
        let root = DeploymentAddress::root("web");
        assert_ne!(root.child("deploy", "db"), root.child("build", "db"));
    }
}

mod release_id_tests {
    use super::*;

    #[test]
    fn parse_with_project() {
        let id = ReleaseId::parse("acme/database-v1.2").unwrap();
        assert_eq!(id.project(), "acme");
        assert_eq!(id.name(), "database");
        assert_eq!(id.version(), Some("1.2"));
        assert_eq!(id.versionless(), "acme/database");
        assert_eq!(id.to_string(), "acme/database-v1.2");
    }

    #[test]
    fn default_project_is_underscore() {
        let id = ReleaseId::parse("archive-full-v0.1").unwrap();
        assert_eq!(id.project(), DEFAULT_PROJECT);
        assert_eq!(id.to_string(), "_/archive-full-v0.1");
    }

    #[test]
    fn tracking_versions_are_kept() {
        let id = ReleaseId::parse("app-v1.@").unwrap();
        assert_eq!(id.version(), Some("1.@"));
        let id = ReleaseId::parse("app-v@").unwrap();
        assert_eq!(id.version(), Some("@"));
    }

    #[test]
    fn latest_means_no_version() {
        let id = ReleaseId::parse("app-latest").unwrap();
        assert_eq!(id.version(), None);
        assert_eq!(id.with_version("2.0").to_string(), "_/app-v2.0");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let id = ReleaseId::parse("  app-v1 ").unwrap();
        assert_eq!(id.name(), "app");
    }

    #[test]
    fn invalid_references() {
        assert_eq!(ReleaseId::parse(""), Err(ReleaseIdError::Empty));
        assert!(matches!(
            ReleaseId::parse("app v1"),
            Err(ReleaseIdError::InvalidChar { found: ' ', .. })
        ));
        assert!(matches!(
            ReleaseId::parse("a/b/c-v1"),
            Err(ReleaseIdError::InvalidFormat(_))
        ));
        assert!(matches!(
            ReleaseId::parse("/app-v1"),
            Err(ReleaseIdError::InvalidFormat(_))
        ));
        assert!(matches!(
            ReleaseId::parse("-v1"),
            Err(ReleaseIdError::InvalidFormat(_))
        ));
        assert!(matches!(
            ReleaseId::parse("app-vnext"),
            Err(ReleaseIdError::MissingVersion(_))
        ));
    }
}
