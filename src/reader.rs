//! Streaming-Einlesen von Schemadokumenten.
//!
//! Die Events kommen aus `quick-xml`; der [`RootHandler`] verteilt sie auf
//! den Handlerbaum. Namespace-Aufloesung (Elemente wie Attribute) erledigt
//! der `NsReader`, die `xmlns`-Deklarationen werden zusaetzlich als
//! Prefix-Mappings an den Schema-Handler gemeldet, weil die QName-Aufloesung
//! von `type=`/`ref=`-Werten sie braucht.

use std::io::BufRead;
use std::rc::Rc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{Error, Result};
use crate::handlers::RootHandler;
use crate::resolver::SchemaResolver;
use crate::schema::Schema;

/// Obergrenze fuer Schemadokumente. Schuetzt vor Speicherexzessen durch
/// defekte oder boeswillige Eingaben.
pub const MAX_XSD_SIZE: usize = 16 * 1024 * 1024;

/// Ein aufgeloestes Attribut eines Start-Events.
struct AttributeValue {
    namespace: Option<String>,
    local: String,
    value: String,
}

/// Die Attribute eines Elements, Namespace-aufgeloest.
#[derive(Default)]
pub struct ElementAttributes {
    items: Vec<AttributeValue>,
}

impl ElementAttributes {
    /// Sucht ein Attribut: zuerst unqualifiziert (der Normalfall in
    /// Schemadokumenten), dann qualifiziert im Namespace des Elements.
    pub fn get(&self, element_ns: &str, local: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.namespace.is_none() && a.local == local)
            .or_else(|| {
                self.items
                    .iter()
                    .find(|a| a.namespace.as_deref() == Some(element_ns) && a.local == local)
            })
            .map(|a| a.value.as_str())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(pairs: &[(&str, &str)]) -> Self {
        ElementAttributes {
            items: pairs
                .iter()
                .map(|(local, value)| AttributeValue {
                    namespace: None,
                    local: (*local).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
        }
    }
}

/// Parst ein Schemadokument aus einem String. `uri` ist die Dokument-URI
/// fuer die relative Aufloesung von `schemaLocation`-Verweisen.
pub fn parse_schema_str(
    xsd: &str,
    uri: Option<&str>,
    resolver: &dyn SchemaResolver,
) -> Result<Rc<Schema>> {
    if xsd.len() > MAX_XSD_SIZE {
        return Err(Error::DocumentTooLarge {
            size: xsd.len(),
            max: MAX_XSD_SIZE,
        });
    }
    parse_schema_reader(xsd.as_bytes(), uri, resolver)
}

/// Parst ein Schemadokument aus einem beliebigen `BufRead`.
pub fn parse_schema_reader<R: BufRead>(
    input: R,
    uri: Option<&str>,
    resolver: &dyn SchemaResolver,
) -> Result<Rc<Schema>> {
    let mut reader = NsReader::from_reader(input);
    let mut root = RootHandler::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => handle_start(&reader, &e, &mut root)?,
            Ok(Event::Empty(e)) => {
                handle_start(&reader, &e, &mut root)?;
                root.end_element()?;
            }
            Ok(Event::End(_)) => root.end_element()?,
            Ok(Event::Eof) => break,
            // Text, Kommentare, PIs und DOCTYPE sind fuer das Modell
            // bedeutungslos
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    root.into_schema(uri, resolver)
}

fn handle_start(
    reader: &NsReader<impl BufRead>,
    e: &BytesStart<'_>,
    root: &mut RootHandler,
) -> Result<()> {
    let mut items = Vec::new();

    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| Error::XmlParse(err.to_string()))?;
        let key = attr.key.as_ref();

        // xmlns/xmlns:* als Prefix-Mapping melden, nicht als Attribut
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            let prefix = if key == b"xmlns" { &b""[..] } else { &key[6..] };
            let prefix = decode(prefix)?;
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlParse(err.to_string()))?;
            root.start_prefix_mapping(&prefix, &value);
            continue;
        }

        let (res, local) = reader.resolve_attribute(attr.key);
        let namespace = match res {
            ResolveResult::Bound(ns) => Some(decode(ns.as_ref())?),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(p) => {
                return Err(Error::XmlParse(format!(
                    "unbekanntes Namespace-Prefix '{}'",
                    String::from_utf8_lossy(&p)
                )))
            }
        };
        items.push(AttributeValue {
            namespace,
            local: decode(local.as_ref())?,
            value: attr
                .unescape_value()
                .map_err(|err| Error::XmlParse(err.to_string()))?
                .into_owned(),
        });
    }

    let (res, local) = reader.resolve_element(e.name());
    let ns = match res {
        ResolveResult::Bound(ns) => decode(ns.as_ref())?,
        ResolveResult::Unbound => String::new(),
        ResolveResult::Unknown(p) => {
            return Err(Error::XmlParse(format!(
                "unbekanntes Namespace-Prefix '{}'",
                String::from_utf8_lossy(&p)
            )))
        }
    };
    let local = decode(local.as_ref())?;

    root.start_element(&ns, &local, &ElementAttributes { items })
}

fn decode(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::XmlParse("ungueltige UTF-8-Sequenz".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::resolver::NoopResolver;
    use crate::schema::{
        AttributeUse, ComplexType, DerivationSet, ElementGrouping, MaxOccurs, SimpleType,
        SimpleTypeDerivation, Type,
    };

    fn parse(xsd: &str) -> Result<Rc<Schema>> {
        parse_schema_str(xsd, None, &NoopResolver)
    }

    fn complex_type<'a>(schema: &'a Schema, name: &str) -> &'a Rc<ComplexType> {
        schema
            .complex_types
            .iter()
            .find(|ct| ct.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("complexType {name} fehlt"))
    }

    fn simple_type<'a>(schema: &'a Schema, name: &str) -> &'a Rc<SimpleType> {
        schema
            .simple_types
            .iter()
            .find(|st| st.name.as_deref() == Some(name))
            .unwrap_or_else(|| panic!("simpleType {name} fehlt"))
    }

    /// Leeres Schema: Kopfattribute landen im kompilierten Modell.
    #[test]
    fn parses_schema_header() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test"
                 version="1.1" elementFormDefault="qualified"/>"#,
        )
        .unwrap();
        assert_eq!(schema.target_namespace.as_deref(), Some("urn:test"));
        assert_eq!(schema.prefix.as_deref(), Some("tns"));
        assert_eq!(schema.version.as_deref(), Some("1.1"));
        assert!(schema.element_form_default);
        assert!(!schema.attribute_form_default);
        assert!(schema.elements.is_empty());
    }

    /// Ein fremdes Dokumentelement ist kein Schema.
    #[test]
    fn rejects_non_schema_root() {
        let err = parse(r#"<html xmlns="http://www.w3.org/1999/xhtml"/>"#).unwrap_err();
        assert!(matches!(err, Error::NotASchema(name) if name == "html"));
    }

    /// Wohlgeformtheitsfehler kommen als XmlParse durch.
    #[test]
    fn propagates_xml_errors() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    /// `type="xs:string"` faellt auf den eingebauten Typ zurueck und teilt
    /// dessen Knoten.
    #[test]
    fn builtin_type_fallback() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="title" type="xs:string"/>
               </xs:schema>"#,
        )
        .unwrap();
        let element = &schema.elements[0];
        assert_eq!(element.name.as_deref(), Some("title"));
        match element.type_.as_ref().unwrap() {
            Type::Simple(st) => {
                assert!(Rc::ptr_eq(st, &builtins::find("string").unwrap()));
            }
            Type::Complex(_) => panic!("Simple Type erwartet"),
        }
    }

    /// Partikel und rekursive Kindersuche ueber den kompilierten Graphen.
    #[test]
    fn compiles_sequence_content() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="PersonType">
                   <xs:sequence>
                     <xs:element name="first" type="xs:string"/>
                     <xs:element name="last" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
                   </xs:sequence>
                   <xs:attribute name="id" type="xs:int" use="required"/>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let person = complex_type(&schema, "PersonType");
        let last = person.find_child_element("last").unwrap();
        assert_eq!(last.occurs.min, 0);
        assert_eq!(last.occurs.max, MaxOccurs::Unbounded);
        assert_eq!(person.attributes.len(), 1);
        assert_eq!(person.attributes[0].use_, AttributeUse::Required);
        assert!(!person.derived);
    }

    /// Ein zweites Ableitungskind unter `simpleType` ist ein Strukturfehler.
    #[test]
    fn rejects_duplicate_derivation_child() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="Broken">
                   <xs:restriction base="xs:string"/>
                   <xs:list itemType="xs:int"/>
                 </xs:simpleType>
               </xs:schema>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateChild { parent: "simpleType", .. }
        ));
    }

    /// Unbekannte block-Token werden hart abgewiesen.
    #[test]
    fn rejects_unknown_block_token() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="e" block="sealed"/>
               </xs:schema>"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownAttributeValue { attribute: "block", .. }
        ));
    }

    /// Facets behalten Dokumentreihenfolge und literale Werte.
    #[test]
    fn collects_facets() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="ZipCode">
                   <xs:restriction base="xs:string">
                     <xs:pattern value="[0-9]{5}"/>
                     <xs:length value="5"/>
                   </xs:restriction>
                 </xs:simpleType>
               </xs:schema>"#,
        )
        .unwrap();
        let zip = simple_type(&schema, "ZipCode");
        assert_eq!(zip.derivation, SimpleTypeDerivation::Restriction);
        assert_eq!(zip.parents.len(), 1);
        assert_eq!(zip.facets.len(), 2);
        assert_eq!(zip.facets[0].value, "[0-9]{5}");
        assert_eq!(zip.facets[1].value, "5");
    }

    /// complexContent-Extension: Basispartikel und Basisattribute wandern in
    /// den abgeleiteten Typ, eigene Beitraege kommen dahinter.
    #[test]
    fn extension_merges_base() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:complexType name="Base">
                   <xs:sequence>
                     <xs:element name="a" type="xs:string"/>
                   </xs:sequence>
                   <xs:attribute name="version" type="xs:string"/>
                 </xs:complexType>
                 <xs:complexType name="Derived">
                   <xs:complexContent>
                     <xs:extension base="tns:Base">
                       <xs:sequence>
                         <xs:element name="b" type="xs:int"/>
                       </xs:sequence>
                       <xs:attribute name="extra" type="xs:string"/>
                     </xs:extension>
                   </xs:complexContent>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let derived = complex_type(&schema, "Derived");
        assert!(derived.derived);
        match derived.parent.as_ref().unwrap() {
            Type::Complex(base) => assert_eq!(base.name.as_deref(), Some("Base")),
            Type::Simple(_) => panic!("komplexe Basis erwartet"),
        }
        // Partikel: konkatenierte Sequenz a, b
        match derived.child.as_ref().unwrap() {
            ElementGrouping::Sequence(s) => {
                let names: Vec<_> = s
                    .children
                    .iter()
                    .filter_map(|c| match c {
                        ElementGrouping::Element(e) => e.name.as_deref().map(str::to_string),
                        _ => None,
                    })
                    .collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            _ => panic!("Sequenz erwartet"),
        }
        let attr_names: Vec<_> = derived
            .attributes
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect();
        assert_eq!(attr_names, vec!["version", "extra"]);
        // Basisattribut wird geteilt, nicht kopiert
        let base = complex_type(&schema, "Base");
        assert!(Rc::ptr_eq(&base.attributes[0], &derived.attributes[0]));
    }

    /// complexContent-Restriction uebernimmt weder Basisattribute noch das
    /// Basispartikel: es zaehlt nur, was die Restriction selbst deklariert.
    #[test]
    fn restriction_takes_only_own_attributes() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:complexType name="Base">
                   <xs:sequence>
                     <xs:element name="a" type="xs:string"/>
                     <xs:element name="b" type="xs:string"/>
                   </xs:sequence>
                   <xs:attribute name="version" type="xs:string"/>
                   <xs:attribute name="lang" type="xs:string"/>
                 </xs:complexType>
                 <xs:complexType name="Narrow">
                   <xs:complexContent>
                     <xs:restriction base="tns:Base">
                       <xs:sequence>
                         <xs:element name="a" type="xs:string"/>
                       </xs:sequence>
                       <xs:attribute name="lang" type="xs:string" use="required"/>
                     </xs:restriction>
                   </xs:complexContent>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let narrow = complex_type(&schema, "Narrow");
        assert!(narrow.derived);
        match narrow.parent.as_ref().unwrap() {
            Type::Complex(base) => assert_eq!(base.name.as_deref(), Some("Base")),
            Type::Simple(_) => panic!("komplexe Basis erwartet"),
        }
        // Nur das eigene Attribut, nicht die der Basis
        assert_eq!(narrow.attributes.len(), 1);
        assert_eq!(narrow.attributes[0].name.as_deref(), Some("lang"));
        assert_eq!(narrow.attributes[0].use_, AttributeUse::Required);
        // Nur das eigene Partikel
        match narrow.child.as_ref().unwrap() {
            ElementGrouping::Sequence(s) => assert_eq!(s.children.len(), 1),
            _ => panic!("Sequenz erwartet"),
        }
    }

    /// simpleContent setzt simple- und mixed-Flag und haengt den Basistyp an.
    #[test]
    fn simple_content_extension() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="Measure">
                   <xs:simpleContent>
                     <xs:extension base="xs:double">
                       <xs:attribute name="uom" type="xs:string" use="required"/>
                     </xs:extension>
                   </xs:simpleContent>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let measure = complex_type(&schema, "Measure");
        assert!(measure.simple);
        assert!(measure.mixed);
        assert!(measure.child.is_none());
        match measure.parent.as_ref().unwrap() {
            Type::Simple(st) => assert_eq!(st.name.as_deref(), Some("double")),
            Type::Complex(_) => panic!("Simple Type erwartet"),
        }
        assert_eq!(measure.attributes.len(), 1);
    }

    /// Elementreferenzen erben Name und Typ des Ziels; lokal gesetzte
    /// Occurs-Werte gewinnen, Defaults erben vom Ziel.
    #[test]
    fn element_ref_inherits() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:element name="item" type="xs:string" nillable="true"/>
                 <xs:complexType name="ListType">
                   <xs:sequence>
                     <xs:element ref="tns:item" maxOccurs="unbounded"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let list = complex_type(&schema, "ListType");
        let item = list.find_child_element("item").unwrap();
        assert_eq!(item.occurs.min, 1);
        assert_eq!(item.occurs.max, MaxOccurs::Unbounded);
        assert!(item.nillable);
        assert!(item.type_.is_some());
        // globales Ziel bleibt bei seinem Default-Occurs
        let global = &schema.elements[0];
        assert_eq!(global.occurs.max, MaxOccurs::Bounded(1));
    }

    /// `ref` zusammen mit `name` ist ein Deklarationskonflikt.
    #[test]
    fn rejects_ref_with_name() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:element name="item" type="xs:string"/>
                 <xs:complexType name="ListType">
                   <xs:sequence>
                     <xs:element ref="tns:item" name="alias"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap_err();
        match err {
            Error::ConflictingDeclaration { name, detail } => {
                assert_eq!(name, "tns:item");
                assert!(detail.contains("ref und name"));
            }
            other => panic!("ConflictingDeclaration erwartet, war {other:?}"),
        }
    }

    /// Union: memberTypes vor inline definierten Membern.
    #[test]
    fn union_members() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:simpleType name="IntOrWord">
                   <xs:union memberTypes="xs:int xs:token">
                     <xs:simpleType>
                       <xs:restriction base="xs:string">
                         <xs:enumeration value="n/a"/>
                       </xs:restriction>
                     </xs:simpleType>
                   </xs:union>
                 </xs:simpleType>
               </xs:schema>"#,
        )
        .unwrap();
        let union = simple_type(&schema, "IntOrWord");
        assert_eq!(union.derivation, SimpleTypeDerivation::Union);
        assert_eq!(union.parents.len(), 3);
        assert_eq!(union.parents[0].name.as_deref(), Some("int"));
        assert_eq!(union.parents[1].name.as_deref(), Some("token"));
        assert_eq!(union.parents[2].name, None);
    }

    /// Tief verschachtelte Inline-Typen: Element mit anonymem complexType,
    /// darin ein Element mit anonymer Liste ueber einem inline simpleType.
    #[test]
    fn nested_inline_types() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="record">
                   <xs:complexType>
                     <xs:sequence>
                       <xs:element name="tags">
                         <xs:simpleType>
                           <xs:list>
                             <xs:simpleType>
                               <xs:restriction base="xs:token"/>
                             </xs:simpleType>
                           </xs:list>
                         </xs:simpleType>
                       </xs:element>
                     </xs:sequence>
                   </xs:complexType>
                 </xs:element>
               </xs:schema>"#,
        )
        .unwrap();
        let record = &schema.elements[0];
        let ct = match record.type_.as_ref().unwrap() {
            Type::Complex(ct) => ct,
            Type::Simple(_) => panic!("anonymer complexType erwartet"),
        };
        let tags = ct.find_child_element("tags").unwrap();
        match tags.type_.as_ref().unwrap() {
            Type::Simple(st) => {
                assert_eq!(st.derivation, SimpleTypeDerivation::List);
                assert_eq!(st.parents.len(), 1);
                assert_eq!(
                    st.parents[0].derivation,
                    SimpleTypeDerivation::Restriction
                );
            }
            Type::Complex(_) => panic!("Listentyp erwartet"),
        }
    }

    /// Import des eigenen Zielnamespace ist ein harter Fehler.
    #[test]
    fn rejects_self_import() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 targetNamespace="urn:test">
                 <xs:import namespace="urn:test" schemaLocation="self.xsd"/>
               </xs:schema>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SelfImport(ns) if ns == "urn:test"));
    }

    /// Unaufloesbare base-Verweise scheitern statt still zu degradieren.
    #[test]
    fn unresolved_base_fails() {
        let err = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:complexType name="Broken">
                   <xs:complexContent>
                     <xs:extension base="tns:Nirgends"/>
                   </xs:complexContent>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeNotFound(name) if name == "tns:Nirgends"));
    }

    /// attributeGroup-Referenzen werden beim Einsammeln ausgeflacht.
    #[test]
    fn attribute_group_flattening() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:attributeGroup name="common">
                   <xs:attribute name="id" type="xs:ID"/>
                   <xs:attribute name="lang" type="xs:language"/>
                 </xs:attributeGroup>
                 <xs:complexType name="Tagged">
                   <xs:sequence/>
                   <xs:attributeGroup ref="tns:common"/>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let tagged = complex_type(&schema, "Tagged");
        let names: Vec<_> = tagged
            .attributes
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect();
        assert_eq!(names, vec!["id", "lang"]);
    }

    /// Gruppenreferenz uebernimmt das Partikel des Ziels, lokale Occurs
    /// gewinnen.
    #[test]
    fn group_ref() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:group name="nameParts">
                   <xs:sequence>
                     <xs:element name="first" type="xs:string"/>
                   </xs:sequence>
                 </xs:group>
                 <xs:complexType name="WithGroup">
                   <xs:sequence>
                     <xs:group ref="tns:nameParts" minOccurs="0"/>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        let with_group = complex_type(&schema, "WithGroup");
        let first = with_group.find_child_element("first").unwrap();
        assert_eq!(first.name.as_deref(), Some("first"));
        match with_group.child.as_ref().unwrap() {
            ElementGrouping::Sequence(s) => match &s.children[0] {
                ElementGrouping::Group(g) => {
                    assert_eq!(g.name.as_deref(), Some("nameParts"));
                    assert_eq!(g.occurs.min, 0);
                }
                _ => panic!("Gruppe erwartet"),
            },
            _ => panic!("Sequenz erwartet"),
        }
    }

    /// Das kompilierte Modell teilt Typknoten statt sie zu kopieren.
    #[test]
    fn shares_type_nodes() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 xmlns:tns="urn:test" targetNamespace="urn:test">
                 <xs:complexType name="T">
                   <xs:sequence/>
                 </xs:complexType>
                 <xs:element name="one" type="tns:T"/>
                 <xs:element name="two" type="tns:T"/>
               </xs:schema>"#,
        )
        .unwrap();
        let t = complex_type(&schema, "T");
        for element in &schema.elements {
            match element.type_.as_ref().unwrap() {
                Type::Complex(ct) => assert!(Rc::ptr_eq(ct, t)),
                Type::Simple(_) => panic!("komplexer Typ erwartet"),
            }
        }
    }

    /// Annotationen und fremde Namespaces werden samt Teilbaum uebersprungen.
    #[test]
    fn skips_annotations_and_foreign_content() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:annotation>
                   <xs:documentation>Beschreibung <b>fett</b></xs:documentation>
                 </xs:annotation>
                 <xs:element name="e" type="xs:string">
                   <xs:annotation><xs:appinfo>x</xs:appinfo></xs:annotation>
                 </xs:element>
               </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(schema.elements.len(), 1);
    }

    /// blockDefault/finalDefault greifen, wo lokal nichts gesetzt ist.
    #[test]
    fn schema_defaults_apply() {
        let schema = parse(
            r##"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                 blockDefault="extension" finalDefault="#all">
                 <xs:element name="plain" type="xs:string"/>
                 <xs:element name="own" type="xs:string" block="restriction"/>
               </xs:schema>"##,
        )
        .unwrap();
        let plain = schema
            .elements
            .iter()
            .find(|e| e.name.as_deref() == Some("plain"))
            .unwrap();
        let own = schema
            .elements
            .iter()
            .find(|e| e.name.as_deref() == Some("own"))
            .unwrap();
        assert_eq!(plain.block, DerivationSet::Extension);
        assert_eq!(plain.final_, DerivationSet::All);
        assert_eq!(own.block, DerivationSet::Restriction);
    }

    /// Zu grosse Dokumente werden vor dem Parsen abgewiesen.
    #[test]
    fn rejects_oversized_documents() {
        let big = " ".repeat(MAX_XSD_SIZE + 1);
        let err = parse(&big).unwrap_err();
        assert!(matches!(err, Error::DocumentTooLarge { .. }));
    }
}
