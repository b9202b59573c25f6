//! SAX-Handlerbaum fuer XML-Schema-Dokumente.
//!
//! Jedes Schema-Konstrukt hat einen eigenen Handler, der seine Attribute
//! beim Start-Event einliest und fertige Kind-Handler beim End-Event
//! einsammelt. Der [`RootHandler`] pumpt die Events in den Baum; nach dem
//! Dokumentende kompiliert [`SchemaHandler::compress`] den Baum in den
//! unveraenderlichen Typ-Graphen aus [`crate::schema`].
//!
//! Die Zuordnung Elementname → Handler laeuft ueber [`Handler::new_child`]
//! statt ueber dynamische Typpruefung; unbekannte oder nicht unterstuetzte
//! Konstrukte (`annotation`, `key`, fremde Namespaces) werden als
//! [`Handler::Ignore`] samt Teilbaum uebersprungen.

mod attribute;
mod complex_type;
mod content;
mod element;
mod group;
mod imports;
mod schema;
mod simple_type;

pub use schema::SchemaHandler;

pub(crate) use attribute::{AnyAttributeHandler, AttributeGroupHandler, AttributeHandler};
pub(crate) use complex_type::ComplexTypeHandler;
pub(crate) use content::{
    ComplexContentHandler, ExtensionHandler, RestrictionHandler, SimpleContentHandler,
};
pub(crate) use element::ElementHandler;
pub(crate) use group::{AllHandler, AnyHandler, ChoiceHandler, GroupHandler, SequenceHandler};
pub(crate) use imports::{ImportHandler, IncludeHandler, RedefineHandler};
pub(crate) use simple_type::{FacetHandler, ListHandler, SimpleTypeHandler, UnionHandler};

use std::rc::Rc;

use log::warn;

use crate::error::{Error, Result};
use crate::reader::ElementAttributes;
use crate::resolver::SchemaResolver;
use crate::schema::{
    AttributeUse, DerivationSet, ElementGrouping, MaxOccurs, Occurs, ProcessContents, Schema,
};
use crate::XSD_NAMESPACE;

/// Ein Knoten im Handlerbaum. Die Varianten spiegeln die unterstuetzten
/// Schema-Konstrukte; `Ignore` schluckt komplette Teilbaeume.
pub(crate) enum Handler {
    Schema(SchemaHandler),
    Element(ElementHandler),
    Attribute(AttributeHandler),
    AttributeGroup(AttributeGroupHandler),
    AnyAttribute(AnyAttributeHandler),
    ComplexType(ComplexTypeHandler),
    SimpleType(SimpleTypeHandler),
    Group(GroupHandler),
    Sequence(SequenceHandler),
    Choice(ChoiceHandler),
    All(AllHandler),
    Any(AnyHandler),
    ComplexContent(ComplexContentHandler),
    SimpleContent(SimpleContentHandler),
    Extension(ExtensionHandler),
    Restriction(RestrictionHandler),
    List(ListHandler),
    Union(UnionHandler),
    Facet(FacetHandler),
    Import(ImportHandler),
    Include(IncludeHandler),
    Redefine(RedefineHandler),
    Ignore,
}

impl Handler {
    /// Erzeugt den Handler fuer ein Kindelement, oder `None` wenn das
    /// Konstrukt an dieser Stelle nicht bekannt ist.
    fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match self {
            Handler::Schema(h) => h.new_child(local),
            Handler::Element(h) => h.new_child(local),
            Handler::Attribute(h) => h.new_child(local),
            Handler::AttributeGroup(h) => h.new_child(local),
            Handler::ComplexType(h) => h.new_child(local),
            Handler::SimpleType(h) => h.new_child(local),
            Handler::Group(h) => h.new_child(local),
            Handler::Sequence(h) => h.new_child(local),
            Handler::Choice(h) => h.new_child(local),
            Handler::All(h) => h.new_child(local),
            Handler::ComplexContent(h) => h.new_child(local),
            Handler::SimpleContent(h) => h.new_child(local),
            Handler::Extension(h) => h.new_child(local),
            Handler::Restriction(h) => h.new_child(local),
            Handler::List(h) => h.new_child(local),
            Handler::Union(h) => h.new_child(local),
            Handler::Redefine(h) => h.new_child(local),
            // Blattkonstrukte ohne modellierte Kinder
            Handler::AnyAttribute(_)
            | Handler::Any(_)
            | Handler::Facet(_)
            | Handler::Import(_)
            | Handler::Include(_) => Ok(None),
            Handler::Ignore => Ok(Some(Handler::Ignore)),
        }
    }

    /// Liest die Attribute des Start-Events ein.
    fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        match self {
            Handler::Schema(h) => h.start_element(ns, atts),
            Handler::Element(h) => h.start_element(ns, atts),
            Handler::Attribute(h) => h.start_element(ns, atts),
            Handler::AttributeGroup(h) => h.start_element(ns, atts),
            Handler::AnyAttribute(h) => h.start_element(ns, atts),
            Handler::ComplexType(h) => h.start_element(ns, atts),
            Handler::SimpleType(h) => h.start_element(ns, atts),
            Handler::Group(h) => h.start_element(ns, atts),
            Handler::Sequence(h) => h.start_element(ns, atts),
            Handler::Choice(h) => h.start_element(ns, atts),
            Handler::All(h) => h.start_element(ns, atts),
            Handler::Any(h) => h.start_element(ns, atts),
            Handler::ComplexContent(h) => h.start_element(ns, atts),
            Handler::SimpleContent(h) => h.start_element(ns, atts),
            Handler::Extension(h) => h.start_element(ns, atts),
            Handler::Restriction(h) => h.start_element(ns, atts),
            Handler::List(h) => h.start_element(ns, atts),
            Handler::Union(h) => h.start_element(ns, atts),
            Handler::Facet(h) => h.start_element(ns, atts),
            Handler::Import(h) => h.start_element(ns, atts),
            Handler::Include(h) => h.start_element(ns, atts),
            Handler::Redefine(h) => h.start_element(ns, atts),
            Handler::Ignore => Ok(()),
        }
    }

    /// Haengt einen fertig geparsten Kind-Handler an.
    fn attach(&mut self, child: Handler) -> Result<()> {
        match self {
            Handler::Schema(h) => h.attach(child),
            Handler::Element(h) => h.attach(child),
            Handler::Attribute(h) => h.attach(child),
            Handler::AttributeGroup(h) => h.attach(child),
            Handler::ComplexType(h) => h.attach(child),
            Handler::SimpleType(h) => h.attach(child),
            Handler::Group(h) => h.attach(child),
            Handler::Sequence(h) => h.attach(child),
            Handler::Choice(h) => h.attach(child),
            Handler::All(h) => h.attach(child),
            Handler::ComplexContent(h) => h.attach(child),
            Handler::SimpleContent(h) => h.attach(child),
            Handler::Extension(h) => h.attach(child),
            Handler::Restriction(h) => h.attach(child),
            Handler::List(h) => h.attach(child),
            Handler::Union(h) => h.attach(child),
            Handler::Redefine(h) => h.attach(child),
            _ => Ok(()),
        }
    }
}

/// Attribut- oder Attributgruppen-Deklaration in einer Kinderliste.
pub(crate) enum AttrDec {
    Attribute(AttributeHandler),
    Group(AttributeGroupHandler),
}

/// Kind eines Partikel-Kontexts (`sequence`, `choice`, `group`, `extension`,
/// `restriction`, `complexType`).
pub(crate) enum GroupingChild {
    All(AllHandler),
    Any(AnyHandler),
    Choice(ChoiceHandler),
    // geboxt: der Elementhandler kann ueber seinen inline-Typ wieder
    // Partikel-Kinder tragen
    Element(Box<ElementHandler>),
    Group(GroupHandler),
    Sequence(SequenceHandler),
}

impl GroupingChild {
    pub fn compress(&self, parent: &SchemaHandler) -> Result<ElementGrouping> {
        Ok(match self {
            GroupingChild::All(h) => ElementGrouping::All(h.compress(parent)?),
            GroupingChild::Any(h) => ElementGrouping::Any(h.compress(parent)?),
            GroupingChild::Choice(h) => ElementGrouping::Choice(h.compress(parent)?),
            GroupingChild::Element(h) => ElementGrouping::Element(h.compress(parent)?),
            GroupingChild::Group(h) => ElementGrouping::Group(h.compress(parent)?),
            GroupingChild::Sequence(h) => ElementGrouping::Sequence(h.compress(parent)?),
        })
    }
}

/// Konstrukte, die nie einen Handler bekommen: Metadaten und
/// Identity-Constraints liegen ausserhalb des kompilierten Modells.
fn is_skipped(local: &str) -> bool {
    matches!(
        local,
        "annotation" | "documentation" | "appinfo" | "unique" | "key" | "keyref" | "notation"
    )
}

/// Pumpt SAX-Events in den Handlerbaum und haelt den fertigen
/// [`SchemaHandler`] nach dem Dokumentende bereit.
pub struct RootHandler {
    stack: Vec<Handler>,
    // xmlns-Deklarationen, die vor dem schema-Element gemeldet werden
    pending_prefixes: Vec<(String, String)>,
    schema: Option<SchemaHandler>,
}

impl RootHandler {
    pub fn new() -> Self {
        RootHandler {
            stack: Vec::new(),
            pending_prefixes: Vec::new(),
            schema: None,
        }
    }

    pub fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
        match self.stack.first_mut() {
            Some(Handler::Schema(s)) => s.start_prefix_mapping(prefix, uri),
            _ => self
                .pending_prefixes
                .push((prefix.to_string(), uri.to_string())),
        }
    }

    pub fn start_element(&mut self, ns: &str, local: &str, atts: &ElementAttributes) -> Result<()> {
        let top = match self.stack.last() {
            Some(top) => top,
            None => {
                // Dokumentelement: muss xsd:schema sein
                if self.schema.is_some() {
                    return Err(Error::XmlParse(
                        "Element nach dem Ende des schema-Elements".to_string(),
                    ));
                }
                if !ns.eq_ignore_ascii_case(XSD_NAMESPACE) || !local.eq_ignore_ascii_case("schema")
                {
                    return Err(Error::NotASchema(local.to_string()));
                }
                let mut s = SchemaHandler::new();
                for (p, u) in self.pending_prefixes.drain(..) {
                    s.start_prefix_mapping(&p, &u);
                }
                s.start_element(ns, atts)?;
                self.stack.push(Handler::Schema(s));
                return Ok(());
            }
        };

        let mut child = if !ns.eq_ignore_ascii_case(XSD_NAMESPACE) || is_skipped(local) {
            Handler::Ignore
        } else {
            match top.new_child(local)? {
                Some(c) => c,
                None => {
                    warn!("Schema-Element <{local}> an dieser Stelle unbekannt, wird uebersprungen");
                    Handler::Ignore
                }
            }
        };
        if !matches!(child, Handler::Ignore) {
            child.start_element(ns, atts)?;
        }
        self.stack.push(child);
        Ok(())
    }

    pub fn end_element(&mut self) -> Result<()> {
        let child = self
            .stack
            .pop()
            .ok_or_else(|| Error::XmlParse("End-Element ohne offenes Start-Element".to_string()))?;
        match self.stack.last_mut() {
            None => match child {
                Handler::Schema(s) => {
                    self.schema = Some(s);
                    Ok(())
                }
                _ => Err(Error::XmlParse(
                    "Handler-Stack inkonsistent am Dokumentende".to_string(),
                )),
            },
            Some(parent) => {
                if matches!(child, Handler::Ignore) {
                    Ok(())
                } else {
                    parent.attach(child)
                }
            }
        }
    }

    /// Kompiliert den eingesammelten Handlerbaum zum Typ-Graphen.
    pub fn into_schema(
        self,
        uri: Option<&str>,
        resolver: &dyn SchemaResolver,
    ) -> Result<Rc<Schema>> {
        let schema = self.schema.ok_or_else(|| {
            Error::XmlParse("Dokument enthielt kein schema-Element".to_string())
        })?;
        schema.compress(uri, resolver)
    }
}

impl Default for RootHandler {
    fn default() -> Self {
        Self::new()
    }
}

// --- Attribut-Parsing -------------------------------------------------------

/// Attributwert, leere Werte zaehlen als nicht gesetzt.
pub(crate) fn att(atts: &ElementAttributes, ns: &str, name: &str) -> Option<String> {
    atts.get(ns, name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Attributwert inklusive leerem String (`default=""` ist gueltig).
pub(crate) fn att_raw(atts: &ElementAttributes, ns: &str, name: &str) -> Option<String> {
    atts.get(ns, name).map(str::to_string)
}

/// XSD-Boolean: `true`/`1` wahr, alles andere (auch fehlend) falsch.
pub(crate) fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v.eq_ignore_ascii_case("true") || v == "1")
}

/// `minOccurs`/`maxOccurs`. Fehlend oder leer ergibt den Default 1;
/// `maxOccurs="unbounded"` ist das Unbounded-Sentinel.
pub(crate) fn parse_occurs(atts: &ElementAttributes, ns: &str) -> Result<Occurs> {
    let min = match atts.get(ns, "minOccurs") {
        None | Some("") => 1,
        Some(v) => v.parse().map_err(|_| Error::InvalidOccurs {
            attribute: "minOccurs",
            value: v.to_string(),
        })?,
    };
    let max = match atts.get(ns, "maxOccurs") {
        None | Some("") => MaxOccurs::Bounded(1),
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(v) => MaxOccurs::Bounded(v.parse().map_err(|_| Error::InvalidOccurs {
            attribute: "maxOccurs",
            value: v.to_string(),
        })?),
    };
    Ok(Occurs { min, max })
}

/// `block`/`final`-Token. Fehlend ergibt [`DerivationSet::Default`], der
/// Vergleich ist wie beim Original case-insensitiv.
pub(crate) fn parse_derivation(
    value: Option<&str>,
    attribute: &'static str,
) -> Result<DerivationSet> {
    match value {
        None | Some("") => Ok(DerivationSet::Default),
        Some(v) if v.eq_ignore_ascii_case("extension") => Ok(DerivationSet::Extension),
        Some(v) if v.eq_ignore_ascii_case("restriction") => Ok(DerivationSet::Restriction),
        Some(v) if v.eq_ignore_ascii_case("#all") => Ok(DerivationSet::All),
        Some(v) => Err(Error::UnknownAttributeValue {
            attribute,
            value: v.to_string(),
        }),
    }
}

/// `use`-Token einer Attributdeklaration.
pub(crate) fn parse_use(value: Option<&str>) -> Result<AttributeUse> {
    match value {
        None | Some("") => Ok(AttributeUse::Optional),
        Some(v) if v.eq_ignore_ascii_case("optional") => Ok(AttributeUse::Optional),
        Some(v) if v.eq_ignore_ascii_case("prohibited") => Ok(AttributeUse::Prohibited),
        Some(v) if v.eq_ignore_ascii_case("required") => Ok(AttributeUse::Required),
        Some(v) => Err(Error::UnknownAttributeValue {
            attribute: "use",
            value: v.to_string(),
        }),
    }
}

/// `processContents`-Token eines Wildcards.
pub(crate) fn parse_process(value: Option<&str>) -> Result<ProcessContents> {
    match value {
        None | Some("") => Ok(ProcessContents::Strict),
        Some(v) if v.eq_ignore_ascii_case("strict") => Ok(ProcessContents::Strict),
        Some(v) if v.eq_ignore_ascii_case("lax") => Ok(ProcessContents::Lax),
        Some(v) if v.eq_ignore_ascii_case("skip") => Ok(ProcessContents::Skip),
        Some(v) => Err(Error::UnknownAttributeValue {
            attribute: "processContents",
            value: v.to_string(),
        }),
    }
}

/// Ist `form` bzw. der Form-Default "qualified"?
pub(crate) fn parse_form(value: Option<&str>, default: bool) -> bool {
    match value {
        None | Some("") => default,
        Some(v) => v.eq_ignore_ascii_case("qualified"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// block/final-Token werden case-insensitiv erkannt, Unbekanntes ist ein
    /// harter Fehler.
    #[test]
    fn derivation_tokens() {
        assert_eq!(parse_derivation(None, "block").unwrap(), DerivationSet::Default);
        assert_eq!(
            parse_derivation(Some("EXTENSION"), "block").unwrap(),
            DerivationSet::Extension
        );
        assert_eq!(
            parse_derivation(Some("#all"), "final").unwrap(),
            DerivationSet::All
        );
        assert!(matches!(
            parse_derivation(Some("sealed"), "block"),
            Err(Error::UnknownAttributeValue { attribute: "block", .. })
        ));
    }

    /// Fehlende Occurs-Attribute ergeben 1..1, "unbounded" das Sentinel.
    #[test]
    fn occurs_defaults_and_sentinel() {
        let empty = ElementAttributes::default();
        let occ = parse_occurs(&empty, XSD_NAMESPACE).unwrap();
        assert_eq!(occ, Occurs::once());

        let atts = ElementAttributes::for_tests(&[("maxOccurs", "unbounded"), ("minOccurs", "0")]);
        let occ = parse_occurs(&atts, XSD_NAMESPACE).unwrap();
        assert_eq!(occ.min, 0);
        assert_eq!(occ.max, MaxOccurs::Unbounded);
    }

    /// Nicht-numerische Occurs-Werte werden abgewiesen.
    #[test]
    fn occurs_rejects_garbage() {
        let atts = ElementAttributes::for_tests(&[("maxOccurs", "viele")]);
        assert!(matches!(
            parse_occurs(&atts, XSD_NAMESPACE),
            Err(Error::InvalidOccurs { attribute: "maxOccurs", .. })
        ));
    }
}
