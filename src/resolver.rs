//! Aufloesung von `import`/`include`-Verweisen auf andere Schemadokumente.
//!
//! Der Parser selbst laedt keine Dokumente nach; jede `schemaLocation` wird
//! an einen [`SchemaResolver`] delegiert. Damit entscheidet der Aufrufer, ob
//! und wie externe Schemata beschafft werden (Dateisystem, vorgeladener
//! Katalog, gar nicht).

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::warn;

use crate::error::{Error, Result};
use crate::reader::{parse_schema_str, MAX_XSD_SIZE};
use crate::schema::Schema;
use crate::FastHashMap;
use crate::FastHashSet;

/// Liefert zu einem `import`/`include` das referenzierte, fertig
/// kompilierte Schema.
///
/// `Ok(None)` bedeutet "nicht aufloesbar" — der Aufrufer ueberspringt den
/// Verweis dann mit einer Warnung statt hart zu scheitern. Nur echte Fehler
/// (defektes Dokument, I/O) werden als `Err` gemeldet.
pub trait SchemaResolver {
    /// `target_namespace` ist der erwartete Namespace des Ziels (bei
    /// `include` der des einbindenden Schemas), `location` die rohe
    /// `schemaLocation` und `base_uri` die URI des Dokuments, in dem der
    /// Verweis steht (fuer relative Aufloesung).
    fn resolve(
        &self,
        target_namespace: Option<&str>,
        location: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<Option<Rc<Schema>>>;
}

/// Loest nie etwas auf. Fuer Dokumente ohne externe Verweise und fuer Tests.
pub struct NoopResolver;

impl SchemaResolver for NoopResolver {
    fn resolve(
        &self,
        _target_namespace: Option<&str>,
        _location: Option<&str>,
        _base_uri: Option<&str>,
    ) -> Result<Option<Rc<Schema>>> {
        Ok(None)
    }
}

/// Laedt Schemata aus dem Dateisystem, relativ zum einbindenden Dokument
/// (Fallback: `base_dir`).
///
/// Jede kanonische Datei wird genau einmal geparst und danach aus dem Cache
/// bedient. Zyklische `include`/`import`-Ketten werden ueber die
/// `loading`-Menge erkannt und mit `Ok(None)` abgebrochen; die bereits
/// eingesammelten Deklarationen der aeusseren Dokumente bleiben erhalten.
pub struct FileResolver {
    base_dir: PathBuf,
    cache: RefCell<FastHashMap<PathBuf, Rc<Schema>>>,
    loading: RefCell<FastHashSet<PathBuf>>,
}

impl FileResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileResolver {
            base_dir: base_dir.into(),
            cache: RefCell::new(FastHashMap::default()),
            loading: RefCell::new(FastHashSet::default()),
        }
    }

    fn locate(&self, location: &str, base_uri: Option<&str>) -> Result<PathBuf> {
        let raw = match base_uri.map(Path::new).and_then(Path::parent) {
            Some(dir) => dir.join(location),
            None => self.base_dir.join(location),
        };
        raw.canonicalize()
            .map_err(|e| Error::Resolver(format!("{}: {e}", raw.display())))
    }
}

impl SchemaResolver for FileResolver {
    fn resolve(
        &self,
        _target_namespace: Option<&str>,
        location: Option<&str>,
        base_uri: Option<&str>,
    ) -> Result<Option<Rc<Schema>>> {
        let location = match location {
            Some(l) if !l.is_empty() => l,
            _ => return Ok(None),
        };
        let path = self.locate(location, base_uri)?;

        if let Some(schema) = self.cache.borrow().get(&path) {
            return Ok(Some(schema.clone()));
        }
        if !self.loading.borrow_mut().insert(path.clone()) {
            warn!("zyklischer Schema-Verweis auf {}, wird uebersprungen", path.display());
            return Ok(None);
        }

        let result = (|| {
            let meta = std::fs::metadata(&path)
                .map_err(|e| Error::Resolver(format!("{}: {e}", path.display())))?;
            if meta.len() > MAX_XSD_SIZE as u64 {
                return Err(Error::DocumentTooLarge {
                    size: meta.len() as usize,
                    max: MAX_XSD_SIZE,
                });
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|e| Error::Resolver(format!("{}: {e}", path.display())))?;
            parse_schema_str(&text, Some(&path.to_string_lossy()), self)
        })();

        self.loading.borrow_mut().remove(&path);
        let schema = result?;
        self.cache.borrow_mut().insert(path, schema.clone());
        Ok(Some(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// NoopResolver meldet jede Location als nicht aufloesbar.
    #[test]
    fn noop_resolver_resolves_nothing() {
        let r = NoopResolver;
        let got = r
            .resolve(Some("urn:x"), Some("other.xsd"), None)
            .unwrap();
        assert!(got.is_none());
    }

    /// Fehlende oder leere Location ist kein Fehler, sondern "nichts zu tun".
    #[test]
    fn file_resolver_ignores_missing_location() {
        let r = FileResolver::new("/tmp");
        assert!(r.resolve(None, None, None).unwrap().is_none());
        assert!(r.resolve(None, Some(""), None).unwrap().is_none());
    }
}
