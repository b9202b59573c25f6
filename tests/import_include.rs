//! Mehrdokument-Szenarien: include-Merge und zyklische Imports.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use xsdgraph::{
    parse_schema_str, Error, Schema, SchemaResolver, Type,
};

/// Loest Locations gegen eine in-memory Dokumentensammlung auf, mit
/// demselben Cache- und Zyklus-Verhalten wie der Datei-Resolver.
struct MapResolver {
    documents: HashMap<&'static str, &'static str>,
    cache: RefCell<HashMap<String, Rc<Schema>>>,
    loading: RefCell<HashSet<String>>,
}

impl MapResolver {
    fn new(documents: &[(&'static str, &'static str)]) -> Self {
        MapResolver {
            documents: documents.iter().copied().collect(),
            cache: RefCell::new(HashMap::new()),
            loading: RefCell::new(HashSet::new()),
        }
    }
}

impl SchemaResolver for MapResolver {
    fn resolve(
        &self,
        _target_namespace: Option<&str>,
        location: Option<&str>,
        _base_uri: Option<&str>,
    ) -> Result<Option<Rc<Schema>>, Error> {
        let location = match location {
            Some(l) => l,
            None => return Ok(None),
        };
        if let Some(schema) = self.cache.borrow().get(location) {
            return Ok(Some(schema.clone()));
        }
        let text = match self.documents.get(location) {
            Some(t) => *t,
            None => return Ok(None),
        };
        if !self.loading.borrow_mut().insert(location.to_string()) {
            // zyklischer Verweis: aeusseres Dokument ist noch in Arbeit
            return Ok(None);
        }
        let result = parse_schema_str(text, Some(location), self);
        self.loading.borrow_mut().remove(location);
        let schema = result?;
        self.cache
            .borrow_mut()
            .insert(location.to_string(), schema.clone());
        Ok(Some(schema))
    }
}

/// include zieht die Deklarationen des Ziels in das einbindende Schema, und
/// lokale Verweise darauf loesen sich auf.
#[test]
fn include_merges_declarations() {
    let resolver = MapResolver::new(&[(
        "types.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             xmlns:tns="urn:app" targetNamespace="urn:app">
             <xs:complexType name="AddressType">
               <xs:sequence>
                 <xs:element name="street" type="xs:string"/>
               </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    )]);

    let schema = parse_schema_str(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             xmlns:tns="urn:app" targetNamespace="urn:app">
             <xs:include schemaLocation="types.xsd"/>
             <xs:element name="address" type="tns:AddressType"/>
           </xs:schema>"#,
        Some("main.xsd"),
        &resolver,
    )
    .unwrap();

    assert_eq!(schema.complex_types.len(), 1);
    let address = &schema.elements[0];
    match address.type_.as_ref().unwrap() {
        Type::Complex(ct) => {
            assert_eq!(ct.name.as_deref(), Some("AddressType"));
            assert!(Rc::ptr_eq(ct, &schema.complex_types[0]));
        }
        Type::Simple(_) => panic!("komplexer Typ erwartet"),
    }
}

/// Dieselbe Location zweimal einzubinden erzeugt keine doppelten
/// Deklarationen: der Resolver liefert denselben Knoten, die Dedup-Passe
/// verwirft die zweite Kopie.
#[test]
fn duplicate_include_is_deduplicated() {
    let resolver = MapResolver::new(&[(
        "types.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             xmlns:tns="urn:app" targetNamespace="urn:app">
             <xs:simpleType name="Code">
               <xs:restriction base="xs:string"/>
             </xs:simpleType>
           </xs:schema>"#,
    )]);

    let schema = parse_schema_str(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             xmlns:tns="urn:app" targetNamespace="urn:app">
             <xs:include schemaLocation="types.xsd"/>
             <xs:include schemaLocation="types.xsd"/>
           </xs:schema>"#,
        Some("main.xsd"),
        &resolver,
    )
    .unwrap();

    assert_eq!(schema.simple_types.len(), 1);
    assert_eq!(schema.simple_types[0].name.as_deref(), Some("Code"));
}

/// Gegenseitige Imports terminieren: der Zyklus wird an der zweiten
/// Aufloesung gekappt, das aeussere Dokument sieht das innere vollstaendig.
#[test]
fn mutual_imports_terminate() {
    let resolver = MapResolver::new(&[
        (
            "a.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:a="urn:a" xmlns:b="urn:b" targetNamespace="urn:a">
                 <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
                 <xs:complexType name="AType">
                   <xs:sequence/>
                 </xs:complexType>
                 <xs:element name="usesB" type="b:BType"/>
               </xs:schema>"#,
        ),
        (
            "b.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:a="urn:a" xmlns:b="urn:b" targetNamespace="urn:b">
                 <xs:import namespace="urn:a" schemaLocation="a.xsd"/>
                 <xs:complexType name="BType">
                   <xs:sequence/>
                 </xs:complexType>
                 <xs:element name="usesA" type="a:AType"/>
               </xs:schema>"#,
        ),
    ]);

    let a = resolver.resolve(Some("urn:a"), Some("a.xsd"), None).unwrap().unwrap();

    // a sieht b vollstaendig
    assert_eq!(a.imports.len(), 1);
    let b = &a.imports[0];
    assert_eq!(b.target_namespace.as_deref(), Some("urn:b"));
    let uses_b = &a.elements[0];
    match uses_b.type_.as_ref().unwrap() {
        Type::Complex(ct) => assert_eq!(ct.name.as_deref(), Some("BType")),
        Type::Simple(_) => panic!("komplexer Typ erwartet"),
    }

    // b wurde mitten im Zyklus kompiliert: der Rueckverweis auf a blieb
    // unaufgeloest, statt die Kompilierung zu sprengen
    assert!(b.imports.is_empty());
    assert!(b.elements[0].type_.is_none());
}

/// Nicht aufloesbare includes sind kein harter Fehler; der Verweis wird
/// uebersprungen.
#[test]
fn unresolvable_include_is_skipped() {
    let resolver = MapResolver::new(&[]);
    let schema = parse_schema_str(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             targetNamespace="urn:app">
             <xs:include schemaLocation="fehlt.xsd"/>
           </xs:schema>"#,
        Some("main.xsd"),
        &resolver,
    )
    .unwrap();
    assert!(schema.complex_types.is_empty());
}
