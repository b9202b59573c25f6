//! Handler fuer Content-Ableitungen: `complexContent`/`simpleContent` und
//! deren `extension`/`restriction`-Kinder.
//!
//! `restriction` ist bewusst ein einziger Handler fuer beide Welten: unter
//! `simpleType` traegt er Basistyp und Facets, unter `complexContent` das
//! Partikel und die Attribute. Der jeweilige Verbraucher liest nur die fuer
//! ihn relevanten Teile.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::handlers::simple_type::facet_kind;
use crate::handlers::{
    att, att_raw, parse_bool, AllHandler, AnyAttributeHandler, AttrDec, AttributeGroupHandler,
    AttributeHandler, ChoiceHandler, FacetHandler, GroupHandler, GroupingChild, Handler,
    SchemaHandler, SequenceHandler, SimpleTypeHandler,
};
use crate::reader::ElementAttributes;
use crate::schema::{Facet, SimpleType};

/// `extension` oder `restriction` unterhalb eines Content-Elements.
pub(crate) enum DerivationChild {
    Extension(ExtensionHandler),
    Restriction(RestrictionHandler),
}

pub(crate) struct ComplexContentHandler {
    #[allow(dead_code)]
    id: Option<String>,
    mixed: bool,
    child: Option<DerivationChild>,
}

impl ComplexContentHandler {
    pub(crate) fn new() -> Self {
        ComplexContentHandler {
            id: None,
            mixed: false,
            child: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.mixed = parse_bool(atts.get(ns, "mixed"));
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        derivation_child(local, self.child.is_some(), "complexContent")
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        self.child = Some(derivation_attach(child, "complexContent"));
        Ok(())
    }

    pub(crate) fn mixed(&self) -> bool {
        self.mixed
    }

    pub(crate) fn derivation(&self) -> Option<&DerivationChild> {
        self.child.as_ref()
    }
}

pub(crate) struct SimpleContentHandler {
    #[allow(dead_code)]
    id: Option<String>,
    child: Option<DerivationChild>,
}

impl SimpleContentHandler {
    pub(crate) fn new() -> Self {
        SimpleContentHandler {
            id: None,
            child: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        derivation_child(local, self.child.is_some(), "simpleContent")
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        self.child = Some(derivation_attach(child, "simpleContent"));
        Ok(())
    }

    pub(crate) fn derivation(&self) -> Option<&DerivationChild> {
        self.child.as_ref()
    }
}

fn derivation_child(
    local: &str,
    occupied: bool,
    parent: &'static str,
) -> Result<Option<Handler>> {
    match local {
        "extension" | "restriction" if occupied => Err(Error::DuplicateChild {
            parent,
            child: local.to_string(),
        }),
        "extension" => Ok(Some(Handler::Extension(ExtensionHandler::new()))),
        "restriction" => Ok(Some(Handler::Restriction(RestrictionHandler::new()))),
        _ => Ok(None),
    }
}

fn derivation_attach(child: Handler, parent: &'static str) -> DerivationChild {
    match child {
        Handler::Extension(h) => DerivationChild::Extension(h),
        Handler::Restriction(h) => DerivationChild::Restriction(h),
        _ => unreachable!("{parent}: unerwarteter Kind-Handler"),
    }
}

pub(crate) struct ExtensionHandler {
    #[allow(dead_code)]
    id: Option<String>,
    base: Option<String>,
    decs: Vec<AttrDec>,
    any_attribute: Option<AnyAttributeHandler>,
    child: Option<GroupingChild>,
    simple_type: Option<SimpleTypeHandler>,
}

impl ExtensionHandler {
    pub(crate) fn new() -> Self {
        ExtensionHandler {
            id: None,
            base: None,
            decs: Vec::new(),
            any_attribute: None,
            child: None,
            simple_type: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.base = att(atts, ns, "base");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "group" | "all" | "choice" | "sequence" if self.child.is_some() => {
                Err(Error::DuplicateChild {
                    parent: "extension",
                    child: local.to_string(),
                })
            }
            "group" => Ok(Some(Handler::Group(GroupHandler::new()))),
            "all" => Ok(Some(Handler::All(AllHandler::new()))),
            "choice" => Ok(Some(Handler::Choice(ChoiceHandler::new()))),
            "sequence" => Ok(Some(Handler::Sequence(SequenceHandler::new()))),
            "attribute" => Ok(Some(Handler::Attribute(AttributeHandler::new()))),
            "attributeGroup" => Ok(Some(Handler::AttributeGroup(AttributeGroupHandler::new()))),
            "anyAttribute" if self.any_attribute.is_some() => Err(Error::DuplicateChild {
                parent: "extension",
                child: local.to_string(),
            }),
            "anyAttribute" => Ok(Some(Handler::AnyAttribute(AnyAttributeHandler::new()))),
            "simpleType" if self.simple_type.is_some() => Err(Error::DuplicateChild {
                parent: "extension",
                child: local.to_string(),
            }),
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Group(h) => self.child = Some(GroupingChild::Group(h)),
            Handler::All(h) => self.child = Some(GroupingChild::All(h)),
            Handler::Choice(h) => self.child = Some(GroupingChild::Choice(h)),
            Handler::Sequence(h) => self.child = Some(GroupingChild::Sequence(h)),
            Handler::Attribute(h) => self.decs.push(AttrDec::Attribute(h)),
            Handler::AttributeGroup(h) => self.decs.push(AttrDec::Group(h)),
            Handler::AnyAttribute(h) => self.any_attribute = Some(h),
            Handler::SimpleType(h) => self.simple_type = Some(h),
            _ => unreachable!("extension: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub(crate) fn decs(&self) -> &[AttrDec] {
        &self.decs
    }

    pub(crate) fn any_attribute(&self) -> Option<&AnyAttributeHandler> {
        self.any_attribute.as_ref()
    }

    pub(crate) fn child(&self) -> Option<&GroupingChild> {
        self.child.as_ref()
    }

    pub(crate) fn simple_type(&self) -> Option<&SimpleTypeHandler> {
        self.simple_type.as_ref()
    }
}

pub(crate) struct RestrictionHandler {
    #[allow(dead_code)]
    id: Option<String>,
    base: Option<String>,
    decs: Vec<AttrDec>,
    any_attribute: Option<AnyAttributeHandler>,
    child: Option<GroupingChild>,
    simple_types: Vec<SimpleTypeHandler>,
    facets: Vec<FacetHandler>,
}

impl RestrictionHandler {
    pub(crate) fn new() -> Self {
        RestrictionHandler {
            id: None,
            base: None,
            decs: Vec::new(),
            any_attribute: None,
            child: None,
            simple_types: Vec::new(),
            facets: Vec::new(),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.base = att(atts, ns, "base");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        if let Some(kind) = facet_kind(local) {
            return Ok(Some(Handler::Facet(FacetHandler::new(kind))));
        }
        match local {
            "group" | "all" | "choice" | "sequence" if self.child.is_some() => {
                Err(Error::DuplicateChild {
                    parent: "restriction",
                    child: local.to_string(),
                })
            }
            "group" => Ok(Some(Handler::Group(GroupHandler::new()))),
            "all" => Ok(Some(Handler::All(AllHandler::new()))),
            "choice" => Ok(Some(Handler::Choice(ChoiceHandler::new()))),
            "sequence" => Ok(Some(Handler::Sequence(SequenceHandler::new()))),
            "attribute" => Ok(Some(Handler::Attribute(AttributeHandler::new()))),
            "attributeGroup" => Ok(Some(Handler::AttributeGroup(AttributeGroupHandler::new()))),
            "anyAttribute" if self.any_attribute.is_some() => Err(Error::DuplicateChild {
                parent: "restriction",
                child: local.to_string(),
            }),
            "anyAttribute" => Ok(Some(Handler::AnyAttribute(AnyAttributeHandler::new()))),
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Group(h) => self.child = Some(GroupingChild::Group(h)),
            Handler::All(h) => self.child = Some(GroupingChild::All(h)),
            Handler::Choice(h) => self.child = Some(GroupingChild::Choice(h)),
            Handler::Sequence(h) => self.child = Some(GroupingChild::Sequence(h)),
            Handler::Attribute(h) => self.decs.push(AttrDec::Attribute(h)),
            Handler::AttributeGroup(h) => self.decs.push(AttrDec::Group(h)),
            Handler::AnyAttribute(h) => self.any_attribute = Some(h),
            Handler::SimpleType(h) => self.simple_types.push(h),
            Handler::Facet(h) => self.facets.push(h),
            _ => unreachable!("restriction: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub(crate) fn decs(&self) -> &[AttrDec] {
        &self.decs
    }

    pub(crate) fn any_attribute(&self) -> Option<&AnyAttributeHandler> {
        self.any_attribute.as_ref()
    }

    pub(crate) fn child(&self) -> Option<&GroupingChild> {
        self.child.as_ref()
    }

    /// Basistypen fuer eine Simple-Type-Restriction: das `base`-Attribut
    /// hat Vorrang vor einem inline definierten `simpleType`.
    pub(crate) fn simple_parents(
        &self,
        parent: &SchemaHandler,
        ctx: &str,
    ) -> Result<Vec<Rc<SimpleType>>> {
        if let Some(base) = self.base.as_deref() {
            let resolved = parent
                .look_up_simple_type(base)?
                .ok_or_else(|| Error::TypeNotFound(base.to_string()))?;
            return Ok(vec![resolved]);
        }
        match self.simple_types.first() {
            Some(h) => Ok(vec![h.compress(parent)?]),
            None => Err(Error::MissingBase(ctx.to_string())),
        }
    }

    pub(crate) fn facet_values(&self) -> Vec<Facet> {
        self.facets.iter().map(FacetHandler::to_facet).collect()
    }
}
