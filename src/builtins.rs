//! Registry der XSD Built-in Simple Types (XSD 1.0 Part 2 §3).
//!
//! Feste Lookup-Tabelle von local-name auf einen vorgebauten [`SimpleType`].
//! Wird bei der Referenz-Auflösung nur als letzter Fallback befragt — und nur
//! für Simple-Type-Referenzen.
//!
//! Wiederholte Lookups liefern dieselbe `Rc`-Instanz (thread-lokale,
//! lazy gebaute Tabelle; der Graph ist single-threaded per Konstruktion).

use std::cell::OnceCell;
use std::rc::Rc;

use crate::schema::{DerivationSet, SimpleType, SimpleTypeDerivation};
use crate::{FastHashMap, XSD_NAMESPACE};

/// Local-names aller Built-in Datatypes (XSD 1.0 Part 2 §3.2, §3.3)
/// plus `anyType`/`anySimpleType` als ur-types.
const BUILTIN_NAMES: &[&str] = &[
    "anyType",
    "anySimpleType",
    "string",
    "normalizedString",
    "token",
    "language",
    "Name",
    "NCName",
    "NMTOKEN",
    "NMTOKENS",
    "ID",
    "IDREF",
    "IDREFS",
    "ENTITY",
    "ENTITIES",
    "NOTATION",
    "QName",
    "boolean",
    "decimal",
    "integer",
    "nonPositiveInteger",
    "negativeInteger",
    "nonNegativeInteger",
    "positiveInteger",
    "long",
    "int",
    "short",
    "byte",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
    "float",
    "double",
    "duration",
    "dateTime",
    "time",
    "date",
    "gYearMonth",
    "gYear",
    "gMonthDay",
    "gDay",
    "gMonth",
    "hexBinary",
    "base64Binary",
    "anyURI",
];

thread_local! {
    static TABLE: OnceCell<FastHashMap<&'static str, Rc<SimpleType>>> = const { OnceCell::new() };
}

fn make(name: &'static str) -> Rc<SimpleType> {
    Rc::new(SimpleType {
        name: Some(Rc::from(name)),
        namespace: Some(Rc::from(XSD_NAMESPACE)),
        id: None,
        derivation: SimpleTypeDerivation::Restriction,
        parents: Vec::new(),
        facets: Vec::new(),
        final_: DerivationSet::Default,
    })
}

/// Liefert den Built-in Simple Type zum local-name, oder None.
pub fn find(local_name: &str) -> Option<Rc<SimpleType>> {
    TABLE.with(|cell| {
        let table = cell.get_or_init(|| {
            BUILTIN_NAMES.iter().map(|n| (*n, make(n))).collect()
        });
        table.get(local_name).cloned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bekannte Built-ins werden gefunden, unbekannte Namen nicht.
    #[test]
    fn find_known_and_unknown() {
        assert!(find("string").is_some());
        assert!(find("nonNegativeInteger").is_some());
        assert!(find("featureCollection").is_none());
    }

    /// Wiederholte Lookups teilen dieselbe Instanz.
    #[test]
    fn lookups_share_instance() {
        let a = find("decimal").unwrap();
        let b = find("decimal").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    /// Built-ins liegen im XSD-Namespace.
    #[test]
    fn builtin_namespace() {
        let t = find("boolean").unwrap();
        assert_eq!(t.namespace.as_deref(), Some(XSD_NAMESPACE));
    }
}
