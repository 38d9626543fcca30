use crate::{
    config::LookupConfig,
    schools::{RawSchoolRecord, SchoolCatalog},
};
use color_eyre::eyre::{Result, WrapErr};
use reqwest::Url;
use std::{sync::Arc, time::Duration};

/// Where candidates for a query come from.
pub enum SchoolSource {
    /// Loaded once, every query sees the whole list.
    Local(Arc<SchoolCatalog>),
    /// Every query asks the API for its own candidates.
    Remote(RemoteLookup),
}

impl SchoolSource {
    pub fn from_config(lookup: &LookupConfig) -> Result<Self> {
        Ok(match lookup {
            LookupConfig::Local { path } => Self::Local(SchoolCatalog::load(path)?),
            LookupConfig::Remote { url } => Self::Remote(RemoteLookup::new(url)?),
        })
    }

    pub async fn candidates(&self, query: &str) -> Result<Arc<SchoolCatalog>> {
        match self {
            SchoolSource::Local(catalog) => Ok(Arc::clone(catalog)),
            SchoolSource::Remote(remote) => remote.search(query).await.map(Arc::new),
        }
    }
}

pub struct RemoteLookup {
    client: reqwest::Client,
    search_url: Url,
}

impl RemoteLookup {
    pub fn new(base_url: &str) -> Result<Self> {
        let search_url = Url::parse(&format!("{}/search", base_url.trim_end_matches('/')))
            .wrap_err("Invalid school lookup url")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .wrap_err("Couldn't build http client")?;

        Ok(Self { client, search_url })
    }

    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("name", query.trim());
        url
    }

    pub async fn search(&self, query: &str) -> Result<SchoolCatalog> {
        tracing::info!("Searching remote school list for `{}`", query);

        let records: Vec<RawSchoolRecord> = self
            .client
            .get(self.search_url(query))
            .send()
            .await
            .wrap_err("School lookup request failed")?
            .error_for_status()
            .wrap_err("School lookup returned an error")?
            .json()
            .await
            .wrap_err("School lookup returned something unexpected")?;

        Ok(SchoolCatalog::from_raw(records))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_search_url() {
        let remote = RemoteLookup::new("http://universities.hipolabs.com/").unwrap();

        assert_eq!(
            remote.search_url(" University of Utah ").as_str(),
            "http://universities.hipolabs.com/search?name=University+of+Utah"
        );
    }

    #[test]
    fn rejects_bad_url() {
        assert!(RemoteLookup::new("not a url").is_err());
    }

    #[tokio::test]
    async fn local_source_shares_the_catalog() {
        let catalog = Arc::new(crate::schools::test_catalog());
        let source = SchoolSource::Local(Arc::clone(&catalog));

        let candidates = source.candidates("anything").await.unwrap();

        assert!(Arc::ptr_eq(&catalog, &candidates));
    }
}
