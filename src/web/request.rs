//! Request and response types of the hours pages.

use super::page::Page;
use crate::libs::config::ANONYMOUS;
use crate::libs::messages::Message;
use crate::libs::permission::{Capability, Permissions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Session values the hours pages read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path_info: String,
    /// Arguments in request order; keys may repeat.
    pub args: Vec<(String, String)>,
    /// `None` for anonymous callers.
    pub authname: Option<String>,
    pub perm: Permissions,
    pub session: Session,
}

impl Request {
    pub fn new(method: Method, path_info: &str) -> Self {
        Request {
            method,
            path_info: path_info.to_string(),
            args: Vec::new(),
            authname: None,
            perm: Permissions::default(),
            session: Session::default(),
        }
    }

    pub fn get(path_info: &str) -> Self {
        Self::new(Method::Get, path_info)
    }

    pub fn post(path_info: &str) -> Self {
        Self::new(Method::Post, path_info)
    }

    pub fn arg(mut self, key: &str, value: &str) -> Self {
        self.args.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends the arguments of a `k=v&...` query string.
    pub fn query_string(mut self, query: &str) -> Self {
        self.args.extend(parse_query_string(query));
        self
    }

    pub fn user(mut self, authname: Option<&str>, perm: Permissions) -> Self {
        self.authname = authname.filter(|name| *name != ANONYMOUS).map(str::to_string);
        self.perm = perm;
        self
    }

    /// First value of `key`.
    pub fn get_arg(&self, key: &str) -> Option<&str> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn has_arg(&self, key: &str) -> bool {
        self.args.iter().any(|(k, _)| k == key)
    }

    pub fn path(&self) -> &str {
        self.path_info.trim_end_matches('/')
    }

    /// Session id: the user name, or `anonymous`.
    pub fn sid(&self) -> &str {
        self.authname.as_deref().unwrap_or(ANONYMOUS)
    }

    /// Name standing in for `$USER` when the caller is not logged in.
    pub fn session_identity(&self) -> Option<&str> {
        self.session.email.as_deref().or(self.session.name.as_deref())
    }

    pub fn require(&self, cap: Capability) -> crate::libs::error::Result<()> {
        self.perm.require(cap)
    }
}

/// Splits `k=v&...` into decoded pairs.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    let decode = |s: &str| {
        let s = s.replace('+', " ");
        urlencoding::decode(&s).map(|d| d.into_owned()).unwrap_or(s)
    };
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub rel: String,
    pub href: String,
    pub title: String,
    pub mime_type: Option<String>,
}

impl Link {
    pub fn new(rel: &str, href: &str, title: &str) -> Self {
        Link {
            rel: rel.to_string(),
            href: href.to_string(),
            title: title.to_string(),
            mime_type: None,
        }
    }

    pub fn alternate(href: &str, title: &str, mime_type: &str) -> Self {
        Link {
            mime_type: Some(mime_type.to_string()),
            ..Link::new("alternate", href, title)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Content {
    Html(Box<Page>),
    Rss(String),
    Csv(Vec<u8>),
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub content: Content,
    pub links: Vec<Link>,
    /// Context navigation shown next to the page.
    pub ctxtnav: Vec<Link>,
    pub warnings: Vec<Message>,
}

impl Response {
    pub fn new(content: Content) -> Self {
        Response {
            content,
            links: Vec::new(),
            ctxtnav: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn html(page: Page) -> Self {
        Self::new(Content::Html(Box::new(page)))
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(Content::Redirect(location.to_string()))
    }

    pub fn link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn ctxtnav(mut self, link: Link) -> Self {
        self.ctxtnav.push(link);
        self
    }

    pub fn warning(mut self, warning: Message) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn location(&self) -> Option<&str> {
        match &self.content {
            Content::Redirect(location) => Some(location),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::report::query_string;

    #[test]
    fn query_strings_decode_and_encode() {
        let args = parse_query_string("?status=new&owner=a%20b&col=id&col=summary&flag");
        assert_eq!(args[1], ("owner".to_string(), "a b".to_string()));
        assert_eq!(args[4], ("flag".to_string(), String::new()));
        assert_eq!(query_string(&args[..2]), "status=new&owner=a%20b");
    }

    #[test]
    fn anonymous_name_is_not_an_identity() {
        let req = Request::get("/hours/").user(Some(ANONYMOUS), Permissions::default());
        assert_eq!(req.authname, None);
        assert_eq!(req.sid(), ANONYMOUS);
        assert_eq!(req.path(), "/hours");
    }
}
