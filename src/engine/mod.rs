//! Metrics engines.
//!
//! The orchestrator talks to an engine only through [`MetricsEngine`]: it hands
//! over the resolved file list, the run's [`EngineContext`] and the output
//! handler, and the engine streams one result per analyzed class into the
//! handler. [`ClassFileEngine`] is the bundled implementation working directly
//! on JVM class files.

pub mod classfile;
pub mod metrics;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::core::environment::EngineContext;
use crate::core::errors::{Result, TaskError};
use crate::io::output::MetricsHandler;

use classfile::ClassFile;
use metrics::ClassMetrics;

/// Name of the root of every class hierarchy.
pub const ROOT_CLASS: &str = "java/lang/Object";

/// Package prefixes treated as platform classes when measuring coupling.
pub const JDK_PREFIXES: &[&str] = &[
    "java/",
    "javax/",
    "org/omg/",
    "org/w3c/dom/",
    "org/xml/sax/",
];

const MAX_HIERARCHY_DEPTH: usize = 256;

/// Counters describing one engine invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSummary {
    /// Classes written to the handler
    pub classes_reported: usize,
    /// Input files that could not be read or were not class files
    pub files_skipped: usize,
}

/// Computes metrics for a set of files and streams them to a handler.
pub trait MetricsEngine {
    /// Analyze `files` and report every class to `handler`, in input order.
    ///
    /// Only failures to write to the handler abort the call; unreadable inputs
    /// are skipped.
    fn run_metrics(
        &self,
        files: &[PathBuf],
        context: &EngineContext,
        handler: &mut dyn MetricsHandler,
    ) -> Result<EngineSummary>;
}

/// Engine computing WMC, DIT, NOC, CBO, RFC, Ca and NPM from class files.
#[derive(Debug, Clone, Default)]
pub struct ClassFileEngine {
    include_jdk: bool,
}

impl ClassFileEngine {
    /// Engine ignoring platform classes when measuring coupling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count platform classes as couplings too.
    pub fn with_jdk_coupling(mut self, include_jdk: bool) -> Self {
        self.include_jdk = include_jdk;
        self
    }

    fn is_counted(&self, class: &str) -> bool {
        self.include_jdk || !JDK_PREFIXES.iter().any(|prefix| class.starts_with(prefix))
    }

    fn load(files: &[PathBuf]) -> (Vec<ClassFile>, usize) {
        let mut classes: Vec<ClassFile> = Vec::with_capacity(files.len());
        let mut seen = HashSet::new();
        let mut skipped = 0;

        for path in files {
            let data = match fs::read(path) {
                Ok(data) => data,
                Err(err) => {
                    warn!("Error loading {}: {err}", path.display());
                    skipped += 1;
                    continue;
                }
            };

            match ClassFile::parse(&data) {
                Ok(class) => {
                    if seen.insert(class.name.clone()) {
                        classes.push(class);
                    } else {
                        warn!(
                            "Class {} loaded again from {}, ignoring duplicate",
                            class.binary_name(),
                            path.display()
                        );
                        skipped += 1;
                    }
                }
                Err(err) => {
                    warn!("Error loading {}: {err}", path.display());
                    skipped += 1;
                }
            }
        }

        (classes, skipped)
    }

    /// Metrics for every loaded class, in load order.
    pub fn compute(&self, classes: &[ClassFile], context: &EngineContext) -> Vec<ClassMetrics> {
        let index: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, class)| (class.name.as_str(), i))
            .collect();

        let efferent: Vec<BTreeSet<&str>> = classes
            .iter()
            .map(|class| {
                class
                    .referenced_classes
                    .iter()
                    .chain(class.interfaces.iter())
                    .map(String::as_str)
                    .filter(|name| *name != class.name && self.is_counted(name))
                    .collect()
            })
            .collect();

        let mut afferent: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); classes.len()];
        for (i, targets) in efferent.iter().enumerate() {
            for target in targets {
                if let Some(&j) = index.get(target) {
                    afferent[j].insert(classes[i].name.as_str());
                }
            }
        }

        let mut children = vec![0usize; classes.len()];
        for class in classes {
            if let Some(&parent) = class.super_name.as_deref().and_then(|s| index.get(s)) {
                children[parent] += 1;
            }
        }

        let mut resolver = SuperclassResolver::new(classes, &index, &context.extension_dirs);

        classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let couplings: BTreeSet<&str> = efferent[i].union(&afferent[i]).copied().collect();

                let mut response: BTreeSet<String> = class
                    .methods
                    .iter()
                    .map(|m| format!("{}.{}{}", class.name, m.name, m.descriptor))
                    .collect();
                response.extend(class.method_refs.iter().cloned());

                ClassMetrics {
                    wmc: class.methods.len(),
                    dit: resolver.depth(class),
                    noc: children[i],
                    cbo: couplings.len(),
                    rfc: response.len(),
                    ca: afferent[i].len(),
                    npm: class.methods.iter().filter(|m| m.is_public()).count(),
                }
            })
            .collect()
    }
}

impl MetricsEngine for ClassFileEngine {
    fn run_metrics(
        &self,
        files: &[PathBuf],
        context: &EngineContext,
        handler: &mut dyn MetricsHandler,
    ) -> Result<EngineSummary> {
        let (classes, files_skipped) = Self::load(files);
        info!(
            "Loaded {} classes from {} files ({} skipped)",
            classes.len(),
            files.len(),
            files_skipped
        );

        let results = self.compute(&classes, context);
        for (class, metrics) in classes.iter().zip(&results) {
            let name = class.binary_name();
            handler.handle_class(&name, metrics).map_err(|err| {
                let message = format!("failed to write results for {name}: {err}");
                TaskError::io(message, err)
            })?;
        }

        Ok(EngineSummary {
            classes_reported: results.len(),
            files_skipped,
        })
    }
}

type JarArchive = ZipArchive<BufReader<File>>;

/// Finds superclasses among the analyzed classes, then in the extension
/// entries: loose `.class` trees, the jars inside those directories, and jars
/// named directly.
struct SuperclassResolver<'a> {
    classes: &'a [ClassFile],
    index: &'a HashMap<&'a str, usize>,
    extension_dirs: &'a [PathBuf],
    external: HashMap<String, Option<Option<String>>>,
    dir_jars: HashMap<PathBuf, Vec<PathBuf>>,
    archives: HashMap<PathBuf, Option<JarArchive>>,
}

impl<'a> SuperclassResolver<'a> {
    fn new(
        classes: &'a [ClassFile],
        index: &'a HashMap<&'a str, usize>,
        extension_dirs: &'a [PathBuf],
    ) -> Self {
        Self {
            classes,
            index,
            extension_dirs,
            external: HashMap::new(),
            dir_jars: HashMap::new(),
            archives: HashMap::new(),
        }
    }

    /// Depth of inheritance. A superclass that cannot be found is assumed to
    /// derive directly from the root.
    fn depth(&mut self, class: &ClassFile) -> usize {
        let mut depth = 0;
        let mut current = class.super_name.clone();
        let mut visited = HashSet::new();

        while let Some(super_name) = current {
            depth += 1;
            if super_name == ROOT_CLASS
                || depth >= MAX_HIERARCHY_DEPTH
                || !visited.insert(super_name.clone())
            {
                break;
            }

            match self.super_of(&super_name) {
                Some(next) => current = next,
                None => {
                    debug!("Superclass {super_name} not found, assuming it extends {ROOT_CLASS}");
                    depth += 1;
                    break;
                }
            }
        }

        depth
    }

    /// `None` when the class cannot be found, otherwise its superclass.
    fn super_of(&mut self, name: &str) -> Option<Option<String>> {
        if let Some(&i) = self.index.get(name) {
            return Some(self.classes[i].super_name.clone());
        }

        if let Some(cached) = self.external.get(name) {
            return cached.clone();
        }

        let found = self.find_external(name);
        self.external.insert(name.to_string(), found.clone());
        found
    }

    fn find_external(&mut self, name: &str) -> Option<Option<String>> {
        let entry_name = format!("{name}.class");
        let extension_dirs = self.extension_dirs;

        for entry in extension_dirs {
            if entry.is_dir() {
                if let Some(class) = read_class(&entry.join(&entry_name)) {
                    return Some(class.super_name);
                }
                for jar in self.jars_in(entry) {
                    if let Some(class) = self.read_from_jar(&jar, &entry_name) {
                        return Some(class.super_name);
                    }
                }
            } else if is_jar(entry) && entry.is_file() {
                if let Some(class) = self.read_from_jar(entry, &entry_name) {
                    return Some(class.super_name);
                }
            } else {
                debug!(
                    "Skipping extension entry {}: not a directory or jar",
                    entry.display()
                );
            }
        }
        None
    }

    fn jars_in(&mut self, dir: &Path) -> Vec<PathBuf> {
        self.dir_jars
            .entry(dir.to_path_buf())
            .or_insert_with(|| list_jars(dir))
            .clone()
    }

    fn read_from_jar(&mut self, jar: &Path, entry_name: &str) -> Option<ClassFile> {
        let archive = self
            .archives
            .entry(jar.to_path_buf())
            .or_insert_with(|| open_jar(jar))
            .as_mut()?;

        let mut entry = archive.by_name(entry_name).ok()?;
        let mut data = Vec::new();
        if let Err(err) = entry.read_to_end(&mut data) {
            debug!("Ignoring {entry_name} in {}: {err}", jar.display());
            return None;
        }
        decode(&data, format_args!("{entry_name} in {}", jar.display()))
    }
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("jar"))
}

/// Jar files directly inside `dir`, sorted by name.
fn list_jars(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Cannot list {}: {err}", dir.display());
            return Vec::new();
        }
    };

    let mut jars: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_jar(path) && path.is_file())
        .collect();
    jars.sort();
    jars
}

fn open_jar(path: &Path) -> Option<JarArchive> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("Cannot open {}: {err}", path.display());
            return None;
        }
    };

    match ZipArchive::new(BufReader::new(file)) {
        Ok(archive) => Some(archive),
        Err(err) => {
            debug!("Ignoring {}: {err}", path.display());
            None
        }
    }
}

fn read_class(path: &Path) -> Option<ClassFile> {
    let data = fs::read(path).ok()?;
    decode(&data, path.display())
}

fn decode(data: &[u8], origin: impl fmt::Display) -> Option<ClassFile> {
    match ClassFile::parse(data) {
        Ok(class) => Some(class),
        Err(err) => {
            debug!("Ignoring {origin}: {err}");
            None
        }
    }
}
