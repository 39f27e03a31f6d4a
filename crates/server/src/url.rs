//! 资源 URL 计算
//!
//! 资源路径为数据库内的物理路径（如 `/site/folder/doc`），结果前缀取自
//! 显式传入的请求或当前请求。

use plone_core::{resolve_request, SharedRequest};
use serde::Deserialize;

use crate::error::ServerError;

/// 虚拟主机前缀 header
pub const VIRTUAL_HOST_HEADER: &str = "X-VirtualHost-Monster";

/// URL 形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// `<scheme>://<host>/<db><path>`，有虚拟主机 header 时为 `<vhm><db><path>`
    #[default]
    Absolute,
    /// `/<db><path>`
    Relative,
    /// 去掉站点段后的路径，只有站点段时为空串
    Site,
}

/// 计算资源 URL
pub fn absolute_url(
    resource_path: &str,
    mode: UrlMode,
    request: Option<SharedRequest>,
) -> Result<String, ServerError> {
    let path = normalize(resource_path)?;

    if mode == UrlMode::Site {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        segments.next();
        let rest: Vec<_> = segments.collect();
        if rest.is_empty() {
            return Ok(String::new());
        }
        return Ok(format!("/{}", rest.join("/")));
    }

    let request = resolve_request(request)?;
    let db_path = match request.db_id() {
        Some(db_id) => format!("{db_id}{path}"),
        None => path.trim_start_matches('/').to_string(),
    };

    let url = match mode {
        UrlMode::Relative => format!("/{db_path}"),
        _ => match request.header(VIRTUAL_HOST_HEADER) {
            Some(virtual_host) => format!("{virtual_host}{db_path}"),
            None => format!("{}://{}/{db_path}", request.scheme(), request.host()),
        },
    };
    Ok(url)
}

fn normalize(resource_path: &str) -> Result<String, ServerError> {
    let segments: Vec<&str> = resource_path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(ServerError::InvalidPath(resource_path.to_string()));
    }
    if segments.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plone_core::{enter, CallFrame, Request, RequestHandler, RequestNotFound};

    fn request(path: &str) -> Request {
        Request::builder("GET", path)
            .host("plone.example.org")
            .scheme("https")
            .build()
    }

    #[test]
    fn test_absolute_from_host() {
        let req = request("/db/site").into();
        let url = absolute_url("/site/folder", UrlMode::Absolute, Some(req)).unwrap();
        assert_eq!(url, "https://plone.example.org/db/site/folder");
    }

    #[test]
    fn test_absolute_with_virtual_host() {
        let req = Request::builder("GET", "/db/site")
            .header(VIRTUAL_HOST_HEADER, "https://cms.example.org/")
            .shared();
        let url = absolute_url("/site/doc", UrlMode::Absolute, Some(req)).unwrap();
        assert_eq!(url, "https://cms.example.org/db/site/doc");
    }

    #[test]
    fn test_relative() {
        let req = request("/zodb/site").into();
        let url = absolute_url("site/doc/", UrlMode::Relative, Some(req)).unwrap();
        assert_eq!(url, "/zodb/site/doc");
    }

    #[test]
    fn test_site_mode_drops_site_segment() {
        assert_eq!(
            absolute_url("/site/folder/doc", UrlMode::Site, None).unwrap(),
            "/folder/doc"
        );
    }

    #[test]
    fn test_site_mode_on_site_root_is_empty() {
        assert_eq!(absolute_url("/site", UrlMode::Site, None).unwrap(), "");
        assert_eq!(absolute_url("/site/", UrlMode::Site, None).unwrap(), "");
    }

    #[test]
    fn test_rejects_parent_segments() {
        assert!(matches!(
            absolute_url("/site/../etc", UrlMode::Relative, None),
            Err(ServerError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_uses_current_request() {
        let req = request("/db/site").into();
        let _frame = enter(CallFrame::handler(RequestHandler::new("http"), req));
        let url = absolute_url("/site", UrlMode::Relative, None).unwrap();
        assert_eq!(url, "/db/site");
    }

    #[test]
    fn test_without_request_fails() {
        assert!(matches!(
            absolute_url("/site", UrlMode::Absolute, None),
            Err(ServerError::RequestNotFound(RequestNotFound::EmptyChain))
        ));
    }

    #[test]
    fn test_root_request_without_db() {
        let req = request("/").into();
        let url = absolute_url("/site", UrlMode::Relative, Some(req)).unwrap();
        assert_eq!(url, "/site");
    }
}
