use serde::{Deserialize, Serialize};

use crate::guid::Guid;
use crate::property::MsiProperty;
use crate::query::{ConfigStore, InstallerQuery, QueryOutcome, CODE_NOT_SUPPORTED};
use crate::version::ProductVersion;

/// One resolved product, shaped for the --json output mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_code: String,
    pub version: Option<String>,
}

/// Iterator over the products sharing an upgrade code, driving the
/// installer's paged enumeration with indices 0, 1, 2, …
///
/// The sequence always terminates cleanly: "no more data" ends it, and an
/// anomalous result code ends it with the failure logged and retained for
/// `failure()`. A page whose text does not parse as a GUID is skipped with
/// a warning rather than cutting the enumeration short.
pub struct RelatedProducts<'a, Q> {
    query: &'a Q,
    upgrade: Guid,
    index: u32,
    done: bool,
    failure: Option<(u32, String)>,
}

impl<'a, Q: InstallerQuery> RelatedProducts<'a, Q> {
    pub fn new(query: &'a Q, upgrade: Guid) -> Self {
        RelatedProducts {
            query,
            upgrade,
            index: 0,
            done: false,
            failure: None,
        }
    }

    /// The anomaly that ended the enumeration early, if any.
    pub fn failure(&self) -> Option<(u32, &str)> {
        self.failure.as_ref().map(|(code, msg)| (*code, msg.as_str()))
    }
}

impl<'a, Q: InstallerQuery> Iterator for RelatedProducts<'a, Q> {
    type Item = Guid;

    fn next(&mut self) -> Option<Guid> {
        while !self.done {
            let page = self.query.related_product(&self.upgrade, self.index);
            self.index += 1;
            match page {
                QueryOutcome::Found(text) => match text.parse::<Guid>() {
                    Ok(product) => return Some(product),
                    Err(err) => {
                        log::warn!("skipping unparsable product code {:?}: {}", text, err);
                    }
                },
                QueryOutcome::NotFound => {
                    self.done = true;
                }
                QueryOutcome::Error { code, message } => {
                    log::error!("enumeration ended early: {}", message);
                    self.failure = Some((code, message));
                    self.done = true;
                }
            }
        }
        None
    }
}

/// Resolves a product's version: the installer's VersionString property
/// first, then the registry DisplayVersion fallback on a miss. A version
/// string that does not parse degrades to the next step rather than
/// failing the lookup; an Error from the primary path is surfaced
/// immediately and the fallback is never consulted.
pub fn resolve_version<Q, S>(query: &Q, store: &S, product: &Guid) -> QueryOutcome<ProductVersion>
where
    Q: InstallerQuery,
    S: ConfigStore,
{
    match query.product_property(product, MsiProperty::VersionString) {
        QueryOutcome::Found(text) => match text.parse::<ProductVersion>() {
            Ok(version) => return QueryOutcome::Found(version),
            Err(()) => {
                log::debug!("product {} has unparsable version {:?}", product, text);
            }
        },
        QueryOutcome::NotFound => {}
        QueryOutcome::Error { code, message } => {
            return QueryOutcome::Error { code, message };
        }
    }

    match fallback_property(store, product, MsiProperty::VersionString) {
        QueryOutcome::Found(text) => match text.parse::<ProductVersion>() {
            Ok(version) => QueryOutcome::Found(version),
            Err(()) => {
                log::debug!("registry fallback for {} is unparsable: {:?}", product, text);
                QueryOutcome::NotFound
            }
        },
        QueryOutcome::NotFound => QueryOutcome::NotFound,
        QueryOutcome::Error { code, message } => QueryOutcome::Error { code, message },
    }
}

/// Routes a property through the registry fallback. Only properties with
/// a registry mapping are readable this way; the rest surface an
/// unsupported error rather than a silent miss.
pub fn fallback_property<S: ConfigStore>(
    store: &S,
    product: &Guid,
    property: MsiProperty,
) -> QueryOutcome<String> {
    match property.fallback_value_name() {
        Some(value_name) => store.install_property(product, value_name),
        None => QueryOutcome::error(
            CODE_NOT_SUPPORTED,
            &format!("no fallback mapping for {}", property.token()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    const UPGRADE: &str = "{A2A8C0B8-0001-4000-8000-000000000001}";
    const PRODUCT: &str = "{B55E0F4A-0002-4000-8000-000000000002}";

    fn upgrade() -> Guid {
        UPGRADE.parse().unwrap()
    }

    fn product() -> Guid {
        PRODUCT.parse().unwrap()
    }

    fn page_guid(n: u8) -> String {
        format!("{{0000000{}-0000-4000-8000-000000000000}}", n)
    }

    /// Scripted installer: pages are returned by index, property lookups
    /// come from a fixed map keyed by product code text.
    struct ScriptedInstaller {
        pages: Vec<QueryOutcome<String>>,
        properties: HashMap<String, QueryOutcome<String>>,
    }

    impl ScriptedInstaller {
        fn with_pages(pages: Vec<QueryOutcome<String>>) -> Self {
            ScriptedInstaller {
                pages,
                properties: HashMap::new(),
            }
        }

        fn with_version(outcome: QueryOutcome<String>) -> Self {
            let mut properties = HashMap::new();
            properties.insert(PRODUCT.to_owned(), outcome);
            ScriptedInstaller {
                pages: vec![],
                properties,
            }
        }
    }

    impl InstallerQuery for ScriptedInstaller {
        fn product_property(&self, product: &Guid, property: MsiProperty) -> QueryOutcome<String> {
            assert_eq!(property, MsiProperty::VersionString);
            self.properties
                .get(&product.to_string())
                .cloned()
                .unwrap_or(QueryOutcome::NotFound)
        }

        fn related_product(&self, _upgrade: &Guid, index: u32) -> QueryOutcome<String> {
            self.pages
                .get(index as usize)
                .cloned()
                .unwrap_or(QueryOutcome::NotFound)
        }
    }

    /// Registry fake that counts reads, so short-circuit behavior is
    /// observable.
    struct ScriptedStore {
        display_version: QueryOutcome<String>,
        reads: Cell<u32>,
    }

    impl ScriptedStore {
        fn new(display_version: QueryOutcome<String>) -> Self {
            ScriptedStore {
                display_version,
                reads: Cell::new(0),
            }
        }

        fn empty() -> Self {
            Self::new(QueryOutcome::NotFound)
        }
    }

    impl ConfigStore for ScriptedStore {
        fn install_property(&self, _product: &Guid, value_name: &str) -> QueryOutcome<String> {
            assert_eq!(value_name, "DisplayVersion");
            self.reads.set(self.reads.get() + 1);
            self.display_version.clone()
        }
    }

    #[test]
    fn empty_enumeration_yields_nothing() {
        let installer = ScriptedInstaller::with_pages(vec![]);
        let mut products = RelatedProducts::new(&installer, upgrade());
        assert_eq!(products.by_ref().count(), 0);
        assert!(products.failure().is_none());
    }

    #[test]
    fn enumeration_terminates_after_no_more_data() {
        let installer = ScriptedInstaller::with_pages(vec![
            QueryOutcome::Found(page_guid(1)),
            QueryOutcome::Found(page_guid(2)),
            QueryOutcome::Found(page_guid(3)),
            QueryOutcome::NotFound,
        ]);
        let mut products = RelatedProducts::new(&installer, upgrade());
        let codes: Vec<Guid> = products.by_ref().collect();
        assert_eq!(codes.len(), 3);
        assert_eq!(codes[0].to_string(), page_guid(1));
        assert_eq!(codes[2].to_string(), page_guid(3));
        assert!(products.failure().is_none());
    }

    #[test]
    fn enumeration_surfaces_error_and_stops() {
        let installer = ScriptedInstaller::with_pages(vec![
            QueryOutcome::Found(page_guid(1)),
            QueryOutcome::error(5, "MsiEnumRelatedProductsW"),
            QueryOutcome::Found(page_guid(2)),
        ]);
        let mut products = RelatedProducts::new(&installer, upgrade());
        let codes: Vec<Guid> = products.by_ref().collect();
        assert_eq!(codes.len(), 1);
        let (code, message) = products.failure().expect("failure should be recorded");
        assert_eq!(code, 5);
        assert!(message.contains("0x5"));
    }

    #[test]
    fn unparsable_page_is_skipped_not_fatal() {
        let installer = ScriptedInstaller::with_pages(vec![
            QueryOutcome::Found(page_guid(1)),
            QueryOutcome::Found("garbage".to_owned()),
            QueryOutcome::Found(page_guid(2)),
            QueryOutcome::NotFound,
        ]);
        let mut products = RelatedProducts::new(&installer, upgrade());
        let codes: Vec<Guid> = products.by_ref().collect();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[1].to_string(), page_guid(2));
        assert!(products.failure().is_none());
    }

    #[test]
    fn resolves_from_primary_query() {
        let installer = ScriptedInstaller::with_version(QueryOutcome::Found("1.2.3.4".to_owned()));
        let store = ScriptedStore::empty();
        let outcome = resolve_version(&installer, &store, &product());
        assert_eq!(
            outcome,
            QueryOutcome::Found("1.2.3.4".parse().unwrap())
        );
        assert_eq!(store.reads.get(), 0);
    }

    #[test]
    fn falls_back_to_registry_on_not_found() {
        let installer = ScriptedInstaller::with_version(QueryOutcome::NotFound);
        let store = ScriptedStore::new(QueryOutcome::Found("5.0.0.0".to_owned()));
        let outcome = resolve_version(&installer, &store, &product());
        assert_eq!(
            outcome,
            QueryOutcome::Found("5.0.0.0".parse().unwrap())
        );
        assert_eq!(store.reads.get(), 1);
    }

    #[test]
    fn malformed_primary_version_degrades_to_fallback() {
        let installer =
            ScriptedInstaller::with_version(QueryOutcome::Found("not-a-version".to_owned()));
        let store = ScriptedStore::empty();
        let outcome = resolve_version(&installer, &store, &product());
        assert_eq!(outcome, QueryOutcome::NotFound);
        assert_eq!(store.reads.get(), 1);
    }

    #[test]
    fn primary_error_short_circuits_fallback() {
        let installer =
            ScriptedInstaller::with_version(QueryOutcome::error(5, "MsiGetProductInfoW"));
        let store = ScriptedStore::new(QueryOutcome::Found("9.9".to_owned()));
        let outcome = resolve_version(&installer, &store, &product());
        match outcome {
            QueryOutcome::Error { code, .. } => assert_eq!(code, 5),
            other => panic!("expected Error, got {:?}", other),
        }
        assert_eq!(store.reads.get(), 0, "fallback must not be consulted");
    }

    #[test]
    fn fallback_rejects_unmapped_properties() {
        let store = ScriptedStore::empty();
        let outcome = fallback_property(&store, &product(), MsiProperty::Publisher);
        match outcome {
            QueryOutcome::Error { code, message } => {
                assert_eq!(code, CODE_NOT_SUPPORTED);
                assert!(message.contains("INSTALLPROPERTY_PUBLISHER"));
            }
            other => panic!("expected Error, got {:?}", other),
        }
        assert_eq!(store.reads.get(), 0);
    }
}
