//! Handler fuer Content-Model-Partikel: `group`, `sequence`, `choice`,
//! `all` und das `any`-Wildcard.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::handlers::{
    att, att_raw, parse_occurs, parse_process, ElementHandler, GroupingChild, Handler,
    SchemaHandler,
};
use crate::reader::ElementAttributes;
use crate::schema::{All, Any, Choice, Group, MaxOccurs, Occurs, Sequence};

pub(crate) struct GroupHandler {
    id: Option<String>,
    name: Option<String>,
    ref_attr: Option<String>,
    occurs: Occurs,
    child: Option<Box<GroupingChild>>,
    cache: RefCell<Option<Rc<Group>>>,
    busy: Cell<bool>,
}

impl GroupHandler {
    pub(crate) fn new() -> Self {
        GroupHandler {
            id: None,
            name: None,
            ref_attr: None,
            occurs: Occurs::once(),
            child: None,
            cache: RefCell::new(None),
            busy: Cell::new(false),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.name = att(atts, ns, "name");
        self.ref_attr = att(atts, ns, "ref");
        self.occurs = parse_occurs(atts, ns)?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "all" | "choice" | "sequence" if self.child.is_some() => Err(Error::DuplicateChild {
                parent: "group",
                child: local.to_string(),
            }),
            "all" => Ok(Some(Handler::All(AllHandler::new()))),
            "choice" => Ok(Some(Handler::Choice(ChoiceHandler::new()))),
            "sequence" => Ok(Some(Handler::Sequence(SequenceHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::All(h) => self.child = Some(Box::new(GroupingChild::All(h))),
            Handler::Choice(h) => self.child = Some(Box::new(GroupingChild::Choice(h))),
            Handler::Sequence(h) => self.child = Some(Box::new(GroupingChild::Sequence(h))),
            _ => unreachable!("group: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn name_matches(&self, local: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(local))
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<Group>> {
        if let Some(group) = self.cache.borrow().as_ref() {
            return Ok(group.clone());
        }
        if self.busy.replace(true) {
            return Err(Error::CircularReference(
                self.name
                    .clone()
                    .or_else(|| self.ref_attr.clone())
                    .unwrap_or_else(|| "group".to_string()),
            ));
        }
        let result = self.compress_inner(parent);
        self.busy.set(false);
        let group = result?;
        *self.cache.borrow_mut() = Some(group.clone());
        Ok(group)
    }

    fn compress_inner(&self, parent: &SchemaHandler) -> Result<Rc<Group>> {
        if let Some(r) = self.ref_attr.as_deref() {
            let target = parent
                .look_up_group(r)?
                .ok_or_else(|| Error::ReferenceNotFound {
                    kind: "group",
                    name: r.to_string(),
                })?;
            let occurs = Occurs {
                min: if self.occurs.min == 1 {
                    target.occurs.min
                } else {
                    self.occurs.min
                },
                max: if self.occurs.max == MaxOccurs::Bounded(1) {
                    target.occurs.max
                } else {
                    self.occurs.max
                },
            };
            return Ok(Rc::new(Group {
                name: target.name.clone(),
                namespace: target.namespace.clone(),
                id: self.id.clone(),
                occurs,
                child: target.child.clone(),
            }));
        }
        let child = match &self.child {
            Some(c) => Some(Box::new(c.compress(parent)?)),
            None => None,
        };
        Ok(Rc::new(Group {
            name: self.name.as_deref().map(Rc::from),
            namespace: parent.target_ns(),
            id: self.id.clone(),
            occurs: self.occurs,
            child,
        }))
    }
}

pub(crate) struct SequenceHandler {
    id: Option<String>,
    occurs: Occurs,
    children: Vec<GroupingChild>,
    cache: RefCell<Option<Rc<Sequence>>>,
}

impl SequenceHandler {
    pub(crate) fn new() -> Self {
        SequenceHandler {
            id: None,
            occurs: Occurs::once(),
            children: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.occurs = parse_occurs(atts, ns)?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        particle_child(local)
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        self.children.push(particle_attach(child, "sequence"));
        Ok(())
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<Sequence>> {
        if let Some(sequence) = self.cache.borrow().as_ref() {
            return Ok(sequence.clone());
        }
        let children = self
            .children
            .iter()
            .map(|c| c.compress(parent))
            .collect::<Result<Vec<_>>>()?;
        let sequence = Rc::new(Sequence {
            id: self.id.clone(),
            occurs: self.occurs,
            children,
        });
        *self.cache.borrow_mut() = Some(sequence.clone());
        Ok(sequence)
    }
}

pub(crate) struct ChoiceHandler {
    id: Option<String>,
    occurs: Occurs,
    children: Vec<GroupingChild>,
    cache: RefCell<Option<Rc<Choice>>>,
}

impl ChoiceHandler {
    pub(crate) fn new() -> Self {
        ChoiceHandler {
            id: None,
            occurs: Occurs::once(),
            children: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.occurs = parse_occurs(atts, ns)?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        particle_child(local)
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        self.children.push(particle_attach(child, "choice"));
        Ok(())
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<Choice>> {
        if let Some(choice) = self.cache.borrow().as_ref() {
            return Ok(choice.clone());
        }
        let children = self
            .children
            .iter()
            .map(|c| c.compress(parent))
            .collect::<Result<Vec<_>>>()?;
        let choice = Rc::new(Choice {
            id: self.id.clone(),
            occurs: self.occurs,
            children,
        });
        *self.cache.borrow_mut() = Some(choice.clone());
        Ok(choice)
    }
}

pub(crate) struct AllHandler {
    id: Option<String>,
    occurs: Occurs,
    elements: Vec<ElementHandler>,
    cache: RefCell<Option<Rc<All>>>,
}

impl AllHandler {
    pub(crate) fn new() -> Self {
        AllHandler {
            id: None,
            occurs: Occurs::once(),
            elements: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.occurs = parse_occurs(atts, ns)?;
        Ok(())
    }

    pub(crate) fn new_child(&self, local: &str) -> Result<Option<Handler>> {
        match local {
            "element" => Ok(Some(Handler::Element(ElementHandler::new()))),
            _ => Ok(None),
        }
    }

    pub(crate) fn attach(&mut self, child: Handler) -> Result<()> {
        match child {
            Handler::Element(h) => self.elements.push(h),
            _ => unreachable!("all: unerwarteter Kind-Handler"),
        }
        Ok(())
    }

    pub(crate) fn compress(&self, parent: &SchemaHandler) -> Result<Rc<All>> {
        if let Some(all) = self.cache.borrow().as_ref() {
            return Ok(all.clone());
        }
        let elements = self
            .elements
            .iter()
            .map(|e| e.compress(parent))
            .collect::<Result<Vec<_>>>()?;
        let all = Rc::new(All {
            id: self.id.clone(),
            occurs: self.occurs,
            elements,
        });
        *self.cache.borrow_mut() = Some(all.clone());
        Ok(all)
    }
}

pub(crate) struct AnyHandler {
    id: Option<String>,
    namespace: Option<String>,
    process: Option<String>,
    occurs: Occurs,
}

impl AnyHandler {
    pub(crate) fn new() -> Self {
        AnyHandler {
            id: None,
            namespace: None,
            process: None,
            occurs: Occurs::once(),
        }
    }

    pub(crate) fn start_element(&mut self, ns: &str, atts: &ElementAttributes) -> Result<()> {
        self.id = att_raw(atts, ns, "id");
        self.namespace = att(atts, ns, "namespace");
        self.process = att(atts, ns, "processContents");
        self.occurs = parse_occurs(atts, ns)?;
        // Token frueh validieren
        parse_process(self.process.as_deref())?;
        Ok(())
    }

    pub(crate) fn compress(&self, _parent: &SchemaHandler) -> Result<Rc<Any>> {
        Ok(Rc::new(Any {
            id: self.id.clone(),
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| "##any".to_string()),
            process: parse_process(self.process.as_deref())?,
            occurs: self.occurs,
        }))
    }
}

/// Gemeinsame Kindauswahl von `sequence` und `choice`.
fn particle_child(local: &str) -> Result<Option<Handler>> {
    Ok(Some(match local {
        "element" => Handler::Element(ElementHandler::new()),
        "group" => Handler::Group(GroupHandler::new()),
        "choice" => Handler::Choice(ChoiceHandler::new()),
        "sequence" => Handler::Sequence(SequenceHandler::new()),
        "any" => Handler::Any(AnyHandler::new()),
        _ => return Ok(None),
    }))
}

fn particle_attach(child: Handler, parent: &'static str) -> GroupingChild {
    match child {
        Handler::Element(h) => GroupingChild::Element(Box::new(h)),
        Handler::Group(h) => GroupingChild::Group(h),
        Handler::Choice(h) => GroupingChild::Choice(h),
        Handler::Sequence(h) => GroupingChild::Sequence(h),
        Handler::Any(h) => GroupingChild::Any(h),
        _ => unreachable!("{parent}: unerwarteter Kind-Handler"),
    }
}
