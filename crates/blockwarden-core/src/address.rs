//! Page address parsing

use url::Url;

/// A page address split the way the engine needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Address without the fragment
    pub page: String,
    /// `scheme://host[:port]`; opaque addresses use the page itself
    pub origin: String,
    pub protocol: String,
    pub host: Option<String>,
    pub query: Option<String>,
    /// Query split on `&` / `;`
    pub args: Vec<String>,
    /// Fragment without the leading `#`
    pub hash: Option<String>,
}

impl ParsedUrl {
    pub fn parse(address: &str) -> Option<Self> {
        let url = Url::parse(address.trim()).ok()?;

        let mut page = url.clone();
        page.set_fragment(None);
        let page = page.to_string();

        let host = url.host_str().map(str::to_string);
        let origin = match &host {
            Some(host) => match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            },
            None => page.clone(),
        };

        Some(Self {
            page,
            origin,
            protocol: url.scheme().to_string(),
            host,
            query: url.query().map(str::to_string),
            args: url
                .query()
                .map(|q| q.split(['&', ';']).map(str::to_string).collect())
                .unwrap_or_default(),
            hash: url.fragment().map(str::to_string),
        })
    }

    /// Page address used for matching: keeps a hash-bang fragment
    pub fn match_address(&self) -> String {
        match &self.hash {
            Some(hash) if hash.starts_with('!') => format!("{}#{}", self.page, hash),
            _ => self.page.clone(),
        }
    }

    /// http, https, file and about pages are subject to blocking
    pub fn is_checkable(&self) -> bool {
        ["http", "file", "about"]
            .iter()
            .any(|p| self.protocol.starts_with(p))
    }

    /// Set and address carried by a block or delaying page
    /// (`...?SET&ADDRESS#hash`)
    pub fn blocked_target(&self) -> Option<(String, String)> {
        let (set, rest) = self.query.as_deref()?.split_once(['&', ';'])?;
        let mut target = rest.to_string();
        if let Some(hash) = &self.hash {
            target.push('#');
            target.push_str(hash);
        }
        Some((set.to_string(), target))
    }
}

/// Site name offered for "add this site": the host without `www.`
pub fn site_for_url(address: &str) -> Option<String> {
    let parsed = ParsedUrl::parse(address)?;
    if !parsed.protocol.starts_with("http") {
        return None;
    }
    let host = parsed.host?;
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
