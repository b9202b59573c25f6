//! Handler fuer `simpleType`-Definitionen samt `list`, `union` und den
//! Facet-Elementen.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::handlers::{att, att_raw, parse_derivation, Handler, RestrictionHandler, SchemaHandler};
use crate::reader::ElementAttributes;
use crate::schema::{DerivationSet, Facet, FacetKind, SimpleType, SimpleTypeDerivation};

enum SimpleDerivationChild {
    Restriction(RestrictionHandler),
    List(ListHandler),
    Union(UnionHandler),
}

pub(crate) struct SimpleTypeHandler {
    id: Option<String>,
    name: Option<String>,
    final_: DerivationSet,
    child: Option<SimpleDerivationChild>,
    cache: RefCell<Option<Rc<SimpleType>>>,
    busy: Cell<bool>,
}

impl SimpleTypeHandler {
    pub(crate) fn new() -> Self {
        SimpleTypeHandler {
            id: None,
            name: None,
            final_: DerivationSet::Default,
            child: None,
            cache: RefCell::new(None),
            busy: Cell::new(false),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.name = att(atts, ns, "name");
        self.final_ = parse_derivation(atts.get(ns, "final"), "final")?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "restriction" | "list" | "union" if self.child.is_some() => {
                Err(Error::DuplicateChild {
                    parent: "simpleType",
                    child: local.to_string(),
                })
            }
            "restriction" => Ok(Some(Handler::Restriction(RestrictionHandler::new()))),
            "list" => Ok(Some(Handler::List(ListHandler::new()))),
            "union" => Ok(Some(Handler::Union(UnionHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Restriction(h) => self.child = Some(SimpleDerivationChild::Restriction(h)),
            Handler::List(h) => self.child = Some(SimpleDerivationChild::List(h)),
            Handler::Union(h) => self.child = Some(SimpleDerivationChild::Union(h)),
            _ => unreachable!("simpleType: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn name_matches(&self, local: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local))
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("simpleType")
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<SimpleType>> {
        if let Some(simple) = self.cache.borrow().as_ref() {
            return Ok(simple.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(self.display_name().to_string()));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let simple = result?;
        *self.cache.borrow_mut() = Some(simple.clone());
        Ok(simple)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<SimpleType>> {
        let (derivation, parents, facets) = match &self.child {
            None => return Err(Error::MissingBase(self.display_name().to_string())),
            Some(SimpleDerivationChild::Restriction(r)) => (
                SimpleTypeDerivation::Restriction,
                r.simple_parents(parent, self.display_name())?,
                r.facet_values(),
            ),
            Some(SimpleDerivationChild::List(l)) => (
                SimpleTypeDerivation::List,
                vec![l.item(parent)?],
                Vec::new(),
            ),
            Some(SimpleDerivationChild::Union(u)) => (
                SimpleTypeDerivation::Union,
                u.members(parent, self.display_name())?,
                Vec::new(),
            ),
        };
        Ok(Rc::new(SimpleType {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            derivation,
            parents,
            facets,
            final_: if self.final_ == DerivationSet::Default {
                parent.final_default()
            } else {
                self.final_
            },
        }))
    }
}

pub(crate) struct ListHandler {
    #[allow(dead_code)]
    id: Option<String>,
    item_type: Option<String>,
    // geboxt: simpleType kann wieder eine Liste mit inline simpleType tragen
    child: Option<Box<SimpleTypeHandler>>,
}

impl ListHandler {
    pub(crate) fn new() -> Self {
        ListHandler {
            id: None,
            item_type: None,
            child: None,
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.item_type = att(atts, ns, "itemType");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "simpleType" if self.child.is_some() => Err(Error::DuplicateChild {
                parent: "list",
                child: local.to_string(),
            }),
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::SimpleType(h) => self.child = Some(Box::new(h)),
            _ => unreachable!("list: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    /// Item-Typ der Liste: `itemType`-Attribut oder der inline definierte
    /// `simpleType`.
    fn item(&self, parent: &SchemaHandler) -> Result<Rc<SimpleType>> {
        if let Some(name) = self.item_type.as_deref() {
            return parent
                .look_up_simple_type(name)?
                .ok_or_else(|| Error::TypeNotFound(name.to_string()));
        }
        match &self.child {
            Some(h) => h.compress(parent),
            None => Err(Error::MissingBase("list".to_string())),
        }
    }
}

pub(crate) struct UnionHandler {
    #[allow(dead_code)]
    id: Option<String>,
    member_types: Option<String>,
    children: Vec<SimpleTypeHandler>,
}

impl UnionHandler {
    pub(crate) fn new() -> Self {
        UnionHandler {
            id: None,
            member_types: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.member_types = att(atts, ns, "memberTypes");
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "simpleType" => Ok(Some(Handler::SimpleType(SimpleTypeHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::SimpleType(h) => self.children.push(h),
            _ => unreachable!("union: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    /// Member in Dokumentreihenfolge: erst die QNames aus `memberTypes`,
    /// dann die inline definierten Typen.
    fn members(&self, parent: &SchemaHandler, ctx: &str) -> Result<Vec<Rc<SimpleType>>> {
        let mut members = Vec::new();
        if let Some(list) = self.member_types.as_deref() {
            for name in list.split_whitespace() {
                members.push(
                    parent
                        .look_up_simple_type(name)?
                        .ok_or_else(|| Error::TypeNotFound(name.to_string()))?,
                );
            }
        }
        for child in &self.children {
            members.push(child.compress(parent)?);
        }
        if members.is_empty() {
            return Err(Error::MissingBase(ctx.to_string()));
        }
        Ok(members)
    }
}

/// Facet-Elementname → Facet-Art, `None` fuer Nicht-Facets.
pub(crate) fn facet_kind(local: &str) -> Option<FacetKind> {
    Some(match local {
        "enumeration" => FacetKind::Enumeration,
        "pattern" => FacetKind::Pattern,
        "length" => FacetKind::Length,
        "minLength" => FacetKind::MinLength,
        "maxLength" => FacetKind::MaxLength,
        "minInclusive" => FacetKind::MinInclusive,
        "maxInclusive" => FacetKind::MaxInclusive,
        "minExclusive" => FacetKind::MinExclusive,
        "maxExclusive" => FacetKind::MaxExclusive,
        "fractionDigits" => FacetKind::FractionDigits,
        "totalDigits" => FacetKind::TotalDigits,
        "whiteSpace" => FacetKind::WhiteSpace,
        _ => return None,
    })
}

pub(crate) struct FacetHandler {
    kind: FacetKind,
    value: Option<String>,
}

impl FacetHandler {
    pub(crate) fn new(kind: FacetKind) -> Self {
        FacetHandler { kind, value: None }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.value = att_raw(atts, ns, "value");
        Ok(())
    }

    pub(crate) fn to_facet(&self) -> Facet {
        Facet {
            kind: self.kind,
            value: self.value.clone().unwrap_or_default(),
        }
    }
}
