//! Identity of the person running the tool, recorded in lock audit records.

use std::env;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use tracing::debug;

/// Who is changing an ACL, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    uid: String,
    ip: String,
}

impl Submitter {
    /// Builds a submitter from explicit values.
    pub fn new(uid: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ip: ip.into(),
        }
    }

    /// Resolves the invoking user and the host's address.
    ///
    /// The account name comes from the passwd entry of the real uid, falling
    /// back to `LOGNAME`/`USER`. The address is the first IPv4 address the
    /// hostname resolves to, or the hostname itself when it does not resolve.
    #[must_use]
    pub fn current() -> Self {
        Self {
            uid: current_user(),
            ip: current_address(),
        }
    }

    /// Account name of the submitter.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Address of the submitting host.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }
}

/// A [`Submitter`] looked up on first use.
///
/// Resolving the host address may query DNS, so read-only commands never
/// pay for it. Clones share the resolved value.
#[derive(Debug, Clone, Default)]
pub struct LazySubmitter(Arc<OnceLock<Submitter>>);

impl LazySubmitter {
    /// Resolves [`Submitter::current`] when first asked.
    #[must_use]
    pub fn current() -> Self {
        Self::default()
    }

    /// Uses a submitter that is already known, such as the one a batch job
    /// was submitted by.
    #[must_use]
    pub fn known(submitter: Submitter) -> Self {
        Self(Arc::new(OnceLock::from(submitter)))
    }

    /// The submitter, resolving it now if needed.
    pub fn get(&self) -> &Submitter {
        self.0.get_or_init(Submitter::current)
    }
}

/// Account name of the real uid.
#[must_use]
pub fn current_user() -> String {
    #[cfg(unix)]
    {
        let uid = nix::unistd::getuid();
        if let Ok(Some(user)) = nix::unistd::User::from_uid(uid) {
            return user.name;
        }
    }
    env::var("LOGNAME")
        .or_else(|_| env::var("USER"))
        .unwrap_or_else(|_| String::from("unknown"))
}

fn current_address() -> String {
    let hostname = match dns_lookup::get_hostname() {
        Ok(name) => name,
        Err(error) => {
            debug!(target: "prjacl::lock", "hostname unavailable: {error}");
            return String::from("127.0.0.1");
        }
    };
    match dns_lookup::lookup_host(&hostname) {
        Ok(addresses) => addresses
            .iter()
            .find(|addr| matches!(addr, IpAddr::V4(_)))
            .or_else(|| addresses.first())
            .map_or(hostname, ToString::to_string),
        Err(error) => {
            debug!(target: "prjacl::lock", "cannot resolve {hostname}: {error}");
            hostname
        }
    }
}
