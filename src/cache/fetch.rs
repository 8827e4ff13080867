use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs as _};
use std::time::Duration;

use url::{Host, Url};

use crate::foundation::config::UrlPolicy;
use crate::foundation::error::{BindError, BindResult};

/// Return `true` for `http://` and `https://` URLs.
pub fn is_http_url(s: &str) -> bool {
    let b = s.as_bytes();
    b.get(..7).is_some_and(|p| p.eq_ignore_ascii_case(b"http://"))
        || b.get(..8).is_some_and(|p| p.eq_ignore_ascii_case(b"https://"))
}

/// Return `true` when `ip` is routable on the public internet.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_v4(v4);
            }
            !(v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local())
        }
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (64..128).contains(&b);
    let reserved = a >= 240;
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || shared
        || reserved)
}

/// Check one URL (or redirect hop) against `policy`.
pub(crate) fn check_url(policy: &UrlPolicy, url: &Url) -> BindResult<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BindError::validation(format!(
            "only http(s) URLs can be fetched, got scheme '{}'",
            url.scheme()
        )));
    }
    let host = url
        .host()
        .ok_or_else(|| BindError::validation(format!("URL '{url}' has no host")))?;
    if !policy.block_private_hosts {
        return Ok(());
    }

    let addrs: Vec<IpAddr> = match host {
        Host::Ipv4(ip) => vec![IpAddr::V4(ip)],
        Host::Ipv6(ip) => vec![IpAddr::V6(ip)],
        Host::Domain(name) => {
            let name = name.to_ascii_lowercase();
            if policy
                .allowed_hosts
                .iter()
                .any(|h| name == *h || name.ends_with(&format!(".{h}")))
            {
                return Ok(());
            }
            let port = url.port_or_known_default().unwrap_or(443);
            (name.as_str(), port)
                .to_socket_addrs()
                .map_err(|e| BindError::io(format!("failed to resolve host '{name}': {e}")))?
                .map(|sa| sa.ip())
                .collect()
        }
    };

    if addrs.is_empty() {
        return Err(BindError::io(format!("host of '{url}' resolved to no address")));
    }
    if let Some(bad) = addrs.iter().find(|ip| !is_public_ip(**ip)) {
        return Err(BindError::validation(format!(
            "refusing to fetch '{url}': host resolves to non-public address {bad}"
        )));
    }
    Ok(())
}

/// Download `url` into `dest`, following redirects manually so every hop is policy-checked.
///
/// Returns the number of bytes written.
pub(crate) fn download(policy: &UrlPolicy, url: &str, dest: &mut impl Write) -> BindResult<u64> {
    let agent = ureq::AgentBuilder::new()
        .redirects(0)
        .timeout(Duration::from_secs(policy.timeout_secs))
        .build();
    let mut current =
        Url::parse(url).map_err(|e| BindError::validation(format!("invalid URL '{url}': {e}")))?;

    for _ in 0..=policy.max_redirects {
        check_url(policy, &current)?;
        let resp = match agent.get(current.as_str()).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, _)) => {
                return Err(BindError::io(format!(
                    "Failed to download file. Status code: {code}"
                )));
            }
            Err(e) => {
                return Err(BindError::io(format!("failed to fetch '{current}': {e}")));
            }
        };

        let status = resp.status();
        if (300..400).contains(&status) {
            let location = resp.header("Location").ok_or_else(|| {
                BindError::io(format!("redirect {status} from '{current}' without Location"))
            })?;
            current = current.join(location).map_err(|e| {
                BindError::io(format!("invalid redirect target '{location}': {e}"))
            })?;
            tracing::debug!(to = %current, "following redirect");
            continue;
        }
        if status != 200 {
            return Err(BindError::io(format!(
                "Failed to download file. Status code: {status}"
            )));
        }

        let mut reader = resp.into_reader();
        return std::io::copy(&mut reader, dest)
            .map_err(|e| BindError::io(format!("failed to read body of '{current}': {e}")));
    }

    Err(BindError::io(format!(
        "too many redirects fetching '{url}' (limit {})",
        policy.max_redirects
    )))
}

/// Last path segment of a URL, used as the cached file name.
pub(crate) fn url_file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?
        .to_string();
    Some(last)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/fetch.rs"]
mod tests;
