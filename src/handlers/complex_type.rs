//! Handler fuer `complexType`-Definitionen und die Verschmelzung von
//! Ableitungsketten.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::handlers::attribute::collect_attributes;
use crate::handlers::content::DerivationChild;
use crate::handlers::{
    att, att_raw, parse_bool, parse_derivation, AllHandler, AnyAttributeHandler, AttrDec,
    AttributeGroupHandler, AttributeHandler, ChoiceHandler, ComplexContentHandler, GroupHandler,
    GroupingChild, Handler, SchemaHandler, SequenceHandler, SimpleContentHandler,
};
use crate::reader::ElementAttributes;
use crate::schema::{
    Attribute, ComplexType, DerivationSet, ElementGrouping, Occurs, Sequence, SimpleType,
    SimpleTypeDerivation, Type,
};

/// Inhalt eines `complexType`: entweder direkt ein Partikel oder eine
/// Content-Ableitung.
enum ContentChild {
    Grouping(GroupingChild),
    Complex(ComplexContentHandler),
    Simple(SimpleContentHandler),
}

pub(crate) struct ComplexTypeHandler {
    id: Option<String>,
    name: Option<String>,
    abstract_: bool,
    mixed: bool,
    block: DerivationSet,
    final_: DerivationSet,
    decs: Vec<AttrDec>,
    any_attribute: Option<AnyAttributeHandler>,
    child: Option<ContentChild>,
    cache: RefCell<Option<Rc<ComplexType>>>,
    busy: Cell<bool>,
}

impl ComplexTypeHandler {
    pub(crate) fn new() -> Self {
        ComplexTypeHandler {
            id: None,
            name: None,
            abstract_: false,
            mixed: false,
            block: DerivationSet::Default,
            final_: DerivationSet::Default,
            decs: Vec::new(),
            any_attribute: None,
            child: None,
            cache: RefCell::new(None),
            busy: Cell::new(false),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.name = att(atts, ns, "name");
        self.abstract_ = parse_bool(atts.get(ns, "abstract"));
        self.mixed = parse_bool(atts.get(ns, "mixed"));
        self.block = parse_derivation(atts.get(ns, "block"), "block")?;
        self.final_ = parse_derivation(atts.get(ns, "final"), "final")?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "group" | "all" | "choice" | "sequence" | "complexContent" | "simpleContent"
                if self.child.is_some() =>
            {
                Err(Error::DuplicateChild {
                    parent: "complexType",
                    child: local.to_string(),
                })
            }
            "group" => Ok(Some(Handler::Group(GroupHandler::new()))),
            "all" => Ok(Some(Handler::All(AllHandler::new()))),
            "choice" => Ok(Some(Handler::Choice(ChoiceHandler::new()))),
            "sequence" => Ok(Some(Handler::Sequence(SequenceHandler::new()))),
            "complexContent" => Ok(Some(Handler::ComplexContent(ComplexContentHandler::new()))),
            "simpleContent" => Ok(Some(Handler::SimpleContent(SimpleContentHandler::new()))),
            "attribute" => Ok(Some(Handler::Attribute(AttributeHandler::new()))),
            "attributeGroup" => Ok(Some(Handler::AttributeGroup(AttributeGroupHandler::new()))),
            "anyAttribute" if self.any_attribute.is_some() => Err(Error::DuplicateChild {
                parent: "complexType",
                child: local.to_string(),
            }),
            "anyAttribute" => Ok(Some(Handler::AnyAttribute(AnyAttributeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Group(h) => self.child = Some(ContentChild::Grouping(GroupingChild::Group(h))),
            Handler::All(h) => self.child = Some(ContentChild::Grouping(GroupingChild::All(h))),
            Handler::Choice(h) => {
                self.child = Some(ContentChild::Grouping(GroupingChild::Choice(h)))
            }
            Handler::Sequence(h) => {
                self.child = Some(ContentChild::Grouping(GroupingChild::Sequence(h)))
            }
            Handler::ComplexContent(h) => self.child = Some(ContentChild::Complex(h)),
            Handler::SimpleContent(h) => self.child = Some(ContentChild::Simple(h)),
            Handler::Attribute(h) => self.decs.push(AttrDec::Attribute(h)),
            Handler::AttributeGroup(h) => self.decs.push(AttrDec::Group(h)),
            Handler::AnyAttribute(h) => self.any_attribute = Some(h),
            _ => unreachable!("complexType: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn name_matches(&self, local: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local))
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("complexType")
    }

    fn missing_content(&self, parent: &SchemaHandler) -> Error {
        Error::MissingContent {
            type_name: self.display_name().to_string(),
            namespace: parent
                .target_ns()
                .map(|ns| ns.to_string())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<ComplexType>> {
        if let Some(complex) = self.cache.borrow().as_ref() {
            return Ok(complex.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(self.display_name().to_string()));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let complex = result?;
        *self.cache.borrow_mut() = Some(complex.clone());
        Ok(complex)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<ComplexType>> {
        let mut attributes: Vec<Rc<Attribute>> = Vec::new();
        let mut parent_type: Option<Type> = None;
        let mut child: Option<ElementGrouping> = None;
        let mut any_attribute = self.any_attribute.as_ref().map(AnyAttributeHandler::namespace);
        let mut simple = false;
        let mut derived = false;
        let mut mixed = self.mixed;

        match &self.child {
            Some(ContentChild::Simple(sch)) => {
                match sch.derivation() {
                    Some(DerivationChild::Extension(ext)) => {
                        collect_attributes(ext.decs(), parent, &mut attributes)?;
                        if any_attribute.is_none() {
                            any_attribute =
                                ext.any_attribute().map(AnyAttributeHandler::namespace);
                        }
                        let st = match ext.base() {
                            Some(base) => parent
                                .look_up_simple_type(base)?
                                .ok_or_else(|| Error::TypeNotFound(base.to_string()))?,
                            None => match ext.simple_type() {
                                Some(h) => h.compress(parent)?,
                                None => {
                                    return Err(Error::MissingBase(
                                        self.display_name().to_string(),
                                    ))
                                }
                            },
                        };
                        parent_type = Some(Type::Simple(st));
                    }
                    Some(DerivationChild::Restriction(rest)) => {
                        collect_attributes(rest.decs(), parent, &mut attributes)?;
                        if any_attribute.is_none() {
                            any_attribute =
                                rest.any_attribute().map(AnyAttributeHandler::namespace);
                        }
                        // anonymer Simple Type, der den Textinhalt beschreibt
                        let st = Rc::new(SimpleType {
                            name: self.name.as_deref().map(Rc::from),
                            namespace: parent.target_ns(),
                            id: self.id.clone(),
                            derivation: SimpleTypeDerivation::Restriction,
                            parents: rest.simple_parents(parent, self.display_name())?,
                            facets: rest.facet_values(),
                            final_: self.effective_final(parent),
                        });
                        parent_type = Some(Type::Simple(st));
                    }
                    None => return Err(self.missing_content(parent)),
                }
                // simpleContent: Textinhalt ist immer erlaubt
                simple = true;
                mixed = true;
            }
            Some(ContentChild::Complex(cch)) => {
                match cch.derivation() {
                    Some(DerivationChild::Extension(ext)) => {
                        let base_name = ext
                            .base()
                            .ok_or_else(|| Error::MissingBase(self.display_name().to_string()))?;
                        let base = parent
                            .look_up_complex_type(base_name)?
                            .ok_or_else(|| Error::TypeNotFound(base_name.to_string()))?;
                        // Basis-Attribute zuerst, eigene ergaenzen
                        for attribute in &base.attributes {
                            attributes.push(attribute.clone());
                        }
                        collect_attributes(ext.decs(), parent, &mut attributes)?;
                        if any_attribute.is_none() {
                            any_attribute =
                                ext.any_attribute().map(AnyAttributeHandler::namespace);
                        }
                        child = match ext.child() {
                            Some(c) => {
                                load_new_eg(base.child.as_ref(), Some(c.compress(parent)?))
                            }
                            None => base.child.clone(),
                        };
                        parent_type = Some(Type::Complex(base));
                    }
                    Some(DerivationChild::Restriction(rest)) => {
                        // Restriction beschreibt den Content neu: nur eigene
                        // Attribute und das eigene Partikel
                        collect_attributes(rest.decs(), parent, &mut attributes)?;
                        if any_attribute.is_none() {
                            any_attribute =
                                rest.any_attribute().map(AnyAttributeHandler::namespace);
                        }
                        child = match rest.child() {
                            Some(c) => Some(c.compress(parent)?),
                            None => None,
                        };
                        let base_name = rest
                            .base()
                            .ok_or_else(|| Error::MissingBase(self.display_name().to_string()))?;
                        let base = parent
                            .look_up_complex_type(base_name)?
                            .ok_or_else(|| Error::TypeNotFound(base_name.to_string()))?;
                        parent_type = Some(Type::Complex(base));
                    }
                    None => return Err(self.missing_content(parent)),
                }
                if child.is_none() {
                    child = Some(empty_sequence());
                }
                if cch.mixed() {
                    mixed = true;
                }
                derived = true;
            }
            Some(ContentChild::Grouping(g)) => {
                collect_attributes(&self.decs, parent, &mut attributes)?;
                child = Some(g.compress(parent)?);
            }
            None => {
                collect_attributes(&self.decs, parent, &mut attributes)?;
                child = Some(empty_sequence());
            }
        }

        if child.is_none() && !self.abstract_ && !simple {
            return Err(self.missing_content(parent));
        }

        Ok(Rc::new(ComplexType {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            parent: parent_type,
            child,
            attributes,
            any_attribute_namespace: any_attribute,
            abstract_: self.abstract_,
            mixed,
            derived,
            simple,
            block: if self.block == DerivationSet::Default {
                parent.block_default()
            } else {
                self.block
            },
            final_: self.effective_final(parent),
        }))
    }

    fn effective_final(&self, parent: &SchemaHandler) -> DerivationSet {
        if self.final_ == DerivationSet::Default {
            parent.final_default()
        } else {
            self.final_
        }
    }
}

fn empty_sequence() -> ElementGrouping {
    ElementGrouping::Sequence(Rc::new(Sequence {
        id: None,
        occurs: Occurs::once(),
        children: Vec::new(),
    }))
}

/// Verschmilzt das Partikel des Basistyps mit dem der Extension zu einem
/// flachen Content-Model.
///
/// Sequenz-Basis wird konkateniert (Sequenz-Extension elementweise),
/// Choice-Basis in eine zweigliedrige Sequenz gehoben, eine Gruppen-Basis
/// auf ihr inneres Partikel reduziert. Alles andere behaelt die Basis bei.
fn load_new_eg(
    base: Option<&ElementGrouping>,
    ext: Option<ElementGrouping>,
) -> Option<ElementGrouping> {
    let base = match base {
        Some(b) => b,
        None => return ext,
    };
    let ext = match ext {
        Some(e) => e,
        None => {
            return match base {
                ElementGrouping::Group(g) => g.child.as_deref().cloned(),
                other => Some(other.clone()),
            }
        }
    };
    Some(match base {
        ElementGrouping::Choice(c) => {
            let children = if c.children.is_empty() {
                vec![ext]
            } else {
                vec![ElementGrouping::Choice(c.clone()), ext]
            };
            ElementGrouping::Sequence(Rc::new(Sequence {
                id: c.id.clone(),
                occurs: c.occurs,
                children,
            }))
        }
        ElementGrouping::Group(g) => match g.child.as_deref() {
            None => ext,
            Some(inner) => return load_new_eg(Some(inner), Some(ext)),
        },
        ElementGrouping::Sequence(s) => {
            let mut children = s.children.clone();
            match ext {
                ElementGrouping::Sequence(s2) => children.extend(s2.children.iter().cloned()),
                other => children.push(other),
            }
            ElementGrouping::Sequence(Rc::new(Sequence {
                id: s.id.clone(),
                occurs: s.occurs,
                children,
            }))
        }
        // All, Any, Element: die Basis bleibt unveraendert
        other => other.clone(),
    })
}
