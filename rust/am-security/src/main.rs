mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use stackable_am_security::{
    config::{HadoopConfiguration, InstanceDefinition},
    filesystem::MountedSharedFileSystem,
    identity::{Identity, IdentityProvider, ProcessIdentityProvider, StaticIdentityProvider},
    security::{self, SecurityConfiguration},
};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[clap(about, author, version)]
struct Opts {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the security configuration and print the principal to log in with.
    Validate(SecurityArguments),

    /// Validate the security configuration and print the path of the keytab to log in with,
    /// staging it from the shared filesystem if needed.
    Stage(StageArguments),
}

#[derive(Args)]
struct SecurityArguments {
    /// Name of the application instance the application master belongs to.
    #[arg(long, env = "CLUSTER_NAME")]
    cluster_name: String,

    /// Cluster configuration, a YAML or JSON map of property names to values.
    #[arg(long, env = "HADOOP_CONFIG")]
    hadoop_config: Option<PathBuf>,

    /// Cluster configuration property, applied on top of `--hadoop-config`.
    #[arg(long = "hadoop-property", value_name = "KEY=VALUE")]
    hadoop_properties: Vec<String>,

    /// Application configuration (JSON or YAML) with the per-component options.
    #[arg(long, env = "APP_CONFIG")]
    app_config: PathBuf,

    /// User the application master runs as. Defaults to `HADOOP_USER_NAME`, then the OS user.
    #[arg(long, env = "LOGIN_USER")]
    login_user: Option<String>,
}

#[derive(Args)]
struct StageArguments {
    #[command(flatten)]
    security: SecurityArguments,

    /// Local mount point of the shared filesystem keytabs are published on.
    #[arg(long, env = "SHARED_FS_ROOT")]
    shared_fs_root: PathBuf,

    /// Owner of the home directory on the shared filesystem. Defaults to the login user.
    #[arg(long, env = "SHARED_FS_USER")]
    shared_fs_user: Option<String>,

    /// Directory to stage downloaded keytabs in. Defaults to the system temporary directory.
    #[arg(long, env = "KEYTAB_STAGING_DIR")]
    staging_dir: Option<PathBuf>,
}

impl SecurityArguments {
    fn load(&self) -> anyhow::Result<SecurityConfiguration> {
        let mut configuration = match &self.hadoop_config {
            Some(path) => HadoopConfiguration::from_file(path)?,
            None => HadoopConfiguration::new(),
        };
        for property in &self.hadoop_properties {
            configuration.apply_override(property)?;
        }
        let instance_definition = InstanceDefinition::from_file(&self.app_config)?;

        match &self.login_user {
            Some(login_user) => SecurityConfiguration::new(
                configuration,
                instance_definition,
                &self.cluster_name,
                StaticIdentityProvider::new(Some(Identity::new(login_user))),
            ),
            None => SecurityConfiguration::new(
                configuration,
                instance_definition,
                &self.cluster_name,
                ProcessIdentityProvider,
            ),
        }
        .inspect_err(report)
        .context("the security configuration of the application master is not usable")
    }

    fn login_identity(&self) -> anyhow::Result<Identity> {
        let identity = match &self.login_user {
            Some(login_user) => Some(Identity::new(login_user)),
            None => ProcessIdentityProvider
                .login_identity()
                .context("failed to look up the login user")?,
        };
        identity.context("no login user to determine the shared filesystem home directory")
    }
}

fn report(err: &security::Error) {
    tracing::error!(
        kind = %err.kind(),
        category = err.category(),
        error = %err,
        "security configuration rejected"
    );
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    logging::init()?;

    tracing::info!(
        built_info.pkg_version = built_info::PKG_VERSION,
        built_info.git_version = built_info::GIT_VERSION,
        built_info.target = built_info::TARGET,
        built_info.built_time_utc = built_info::BUILT_TIME_UTC,
        built_info.rustc_version = built_info::RUSTC_VERSION,
        "Starting {description}",
        description = built_info::PKG_DESCRIPTION
    );

    match opts.cmd {
        Command::Validate(arguments) => {
            let security_configuration = arguments.load()?;
            if !security_configuration.is_security_enabled() {
                tracing::info!("cluster does not require authentication");
                return Ok(());
            }
            let principal = security_configuration.principal().inspect_err(report)?;
            println!("{principal}");
        }
        Command::Stage(StageArguments {
            security,
            shared_fs_root,
            shared_fs_user,
            staging_dir,
        }) => {
            let mut security_configuration = security.load()?;
            if !security_configuration.is_security_enabled() {
                tracing::info!("cluster does not require authentication, no keytab needed");
                return Ok(());
            }
            if let Some(staging_dir) = staging_dir {
                security_configuration = security_configuration.with_staging_root(staging_dir);
            }

            let shared_fs_user = match shared_fs_user {
                Some(shared_fs_user) => shared_fs_user,
                None => security.login_identity()?.short_name().to_string(),
            };
            let fs = MountedSharedFileSystem::new(shared_fs_root, &shared_fs_user);

            let principal = security_configuration.principal().inspect_err(report)?;
            let keytab = security_configuration
                .keytab_file(&fs, &principal)
                .inspect_err(report)?;
            println!("{}", keytab.display());
        }
    }

    Ok(())
}
