use snafu::{OptionExt, ResultExt};

use crate::{
    config::KEY_KEYTAB_PRINCIPAL,
    security::{
        keytab::KeytabSource, InvalidHadoopConfigurationSnafu, LoginIdentityLookupSnafu,
        NoPrincipalSnafu, Result, SecurityConfiguration,
    },
};

/// Checks the shape of the security settings, not whether the credentials actually work.
pub(super) fn validate(security_configuration: &SecurityConfiguration) -> Result<()> {
    let authentication_method = security_configuration
        .configuration
        .authentication_method()
        .context(InvalidHadoopConfigurationSnafu)?;
    if !authentication_method.is_secure() {
        tracing::debug!(
            %authentication_method,
            "cluster does not require authentication, skipping security validation"
        );
        return Ok(());
    }

    let am = security_configuration.am_options();
    if !am.is_set(KEY_KEYTAB_PRINCIPAL) {
        // if no login identity is available, fail
        let login_identity = security_configuration
            .login_identity()
            .context(LoginIdentityLookupSnafu {
                key: KEY_KEYTAB_PRINCIPAL,
            })?
            .context(NoPrincipalSnafu {
                key: KEY_KEYTAB_PRINCIPAL,
            })?;
        tracing::debug!(
            login_identity = %login_identity,
            "no principal configured, the login identity will be used"
        );
    }

    let keytab_source = KeytabSource::from_options(&am)?;
    tracing::debug!(
        cluster_name = %security_configuration.cluster_name,
        %authentication_method,
        ?keytab_source,
        "validated security configuration"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{
        config::{
            HadoopConfiguration, InstanceDefinition, KEY_AM_KEYTAB_LOCAL_PATH,
            KEY_AM_LOGIN_KEYTAB_NAME, KEY_KEYTAB_PRINCIPAL,
        },
        security::{
            tests::{am_instance, hadoop_configuration, FakeIdentityProvider},
            Error, ErrorKind, SecurityConfiguration,
        },
    };

    fn build(
        configuration: HadoopConfiguration,
        instance: InstanceDefinition,
        identity: FakeIdentityProvider,
    ) -> Result<SecurityConfiguration, Error> {
        SecurityConfiguration::new(configuration, instance, "cl1", identity)
    }

    #[rstest]
    #[case(&[])]
    #[case(&[(KEY_AM_KEYTAB_LOCAL_PATH, "/etc/security/app.keytab"), (KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")])]
    #[case(&[(KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")])]
    fn test_security_disabled_skips_validation(#[case] options: &[(&str, &str)]) {
        // The identity provider would fail every lookup, it must not even be asked
        for configuration in [HadoopConfiguration::new(), hadoop_configuration("simple")] {
            let security_configuration = build(
                configuration,
                am_instance(options),
                FakeIdentityProvider::Broken,
            )
            .unwrap();
            assert!(!security_configuration.is_security_enabled());
        }
    }

    #[rstest]
    #[case(&[(KEY_KEYTAB_PRINCIPAL, "am@EXAMPLE.COM")])]
    #[case(&[(KEY_KEYTAB_PRINCIPAL, "am@EXAMPLE.COM"), (KEY_AM_KEYTAB_LOCAL_PATH, ""), (KEY_AM_LOGIN_KEYTAB_NAME, "")])]
    fn test_no_keytab_source(#[case] options: &[(&str, &str)]) {
        let err = build(
            hadoop_configuration("kerberos"),
            am_instance(options),
            FakeIdentityProvider::User("am"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoKeytabSource { .. }));
        assert_eq!(err.kind(), ErrorKind::BadConfiguration);
        let message = err.to_string();
        assert!(message.contains(KEY_AM_KEYTAB_LOCAL_PATH));
        assert!(message.contains(KEY_AM_LOGIN_KEYTAB_NAME));
    }

    #[rstest]
    #[case("/etc/security/app.keytab", "app.keytab")]
    #[case("x", "y")]
    fn test_ambiguous_keytab_source(#[case] local_path: &str, #[case] remote_name: &str) {
        let err = build(
            hadoop_configuration("kerberos"),
            am_instance(&[
                (KEY_KEYTAB_PRINCIPAL, "am@EXAMPLE.COM"),
                (KEY_AM_KEYTAB_LOCAL_PATH, local_path),
                (KEY_AM_LOGIN_KEYTAB_NAME, remote_name),
            ]),
            FakeIdentityProvider::User("am"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AmbiguousKeytabSource { .. }));
        assert_eq!(err.kind(), ErrorKind::BadConfiguration);
    }

    #[rstest]
    #[case(KEY_AM_KEYTAB_LOCAL_PATH, "/etc/security/app.keytab")]
    #[case(KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")]
    #[case(KEY_AM_LOGIN_KEYTAB_NAME, "nested/app.keytab")]
    fn test_exactly_one_keytab_source(#[case] key: &str, #[case] value: &str) {
        let security_configuration = build(
            hadoop_configuration("kerberos"),
            am_instance(&[(KEY_KEYTAB_PRINCIPAL, "am/host@EXAMPLE.COM"), (key, value)]),
            FakeIdentityProvider::Broken,
        )
        .unwrap();
        assert!(security_configuration.is_security_enabled());
    }

    #[test]
    fn test_missing_principal_with_login_identity() {
        let security_configuration = build(
            hadoop_configuration("kerberos"),
            am_instance(&[(KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")]),
            FakeIdentityProvider::User("hive/host@EXAMPLE.COM"),
        )
        .unwrap();
        assert_eq!(security_configuration.principal().unwrap(), "hive");
    }

    #[test]
    fn test_missing_principal_without_login_identity() {
        let err = build(
            hadoop_configuration("kerberos"),
            am_instance(&[(KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")]),
            FakeIdentityProvider::Missing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoPrincipal { .. }));
        assert_eq!(err.kind(), ErrorKind::BadConfiguration);
        assert!(err.to_string().contains(KEY_KEYTAB_PRINCIPAL));
    }

    #[test]
    fn test_missing_principal_with_broken_login_lookup() {
        let err = build(
            hadoop_configuration("kerberos"),
            am_instance(&[(KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab")]),
            FakeIdentityProvider::Broken,
        )
        .unwrap_err();
        assert!(matches!(err, Error::LoginIdentityLookup { .. }));
        assert_eq!(err.kind(), ErrorKind::BadState);
    }

    #[test]
    fn test_empty_principal_counts_as_missing() {
        let err = build(
            hadoop_configuration("kerberos"),
            am_instance(&[
                (KEY_KEYTAB_PRINCIPAL, ""),
                (KEY_AM_LOGIN_KEYTAB_NAME, "app.keytab"),
            ]),
            FakeIdentityProvider::Missing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoPrincipal { .. }));
    }

    #[test]
    fn test_unknown_authentication_method() {
        let err = build(
            hadoop_configuration("digest"),
            InstanceDefinition::default(),
            FakeIdentityProvider::Missing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidHadoopConfiguration { .. }));
        assert_eq!(err.kind(), ErrorKind::BadConfiguration);
    }

    #[test]
    fn test_principal_is_checked_before_keytab_sources() {
        let err = build(
            hadoop_configuration("kerberos"),
            InstanceDefinition::default(),
            FakeIdentityProvider::Missing,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoPrincipal { .. }));
    }
}
