//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Builds minimal class files: a name, a superclass, public methods and calls.
pub struct ClassBuilder {
    name: String,
    super_name: String,
    methods: Vec<(String, String)>,
    calls: Vec<(String, String, String)>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: "java/lang/Object".to_string(),
            methods: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn extends(mut self, super_name: &str) -> Self {
        self.super_name = super_name.to_string();
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        self.methods.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn calls(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.calls
            .push((owner.to_string(), name.to_string(), descriptor.to_string()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_index = pool.class(&self.name);
        let super_index = pool.class(&self.super_name);
        let methods: Vec<(u16, u16)> = self
            .methods
            .iter()
            .map(|(name, desc)| (pool.utf8(name), pool.utf8(desc)))
            .collect();
        for (owner, name, desc) in &self.calls {
            pool.method_ref(owner, name, desc);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&pool.next_index.to_be_bytes());
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this_index.to_be_bytes());
        out.extend_from_slice(&super_index.to_be_bytes());
        // interfaces, fields
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(methods.len() as u16).to_be_bytes());
        for (name, desc) in methods {
            out.extend_from_slice(&0x0001u16.to_be_bytes());
            out.extend_from_slice(&name.to_be_bytes());
            out.extend_from_slice(&desc.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes());
        }
        // class attributes
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }

    /// Write the class under `root` at its package path and return that path.
    pub fn write_to(self, root: &Path) -> PathBuf {
        let path = root.join(format!("{}.class", self.name));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, self.build()).unwrap();
        path
    }
}

struct Pool {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
        }
    }
}

impl Pool {
    fn push(&mut self, entry: &[u8]) -> u16 {
        let index = self.next_index;
        self.bytes.extend_from_slice(entry);
        self.next_index += 1;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        let mut entry = vec![1];
        entry.extend_from_slice(&(value.len() as u16).to_be_bytes());
        entry.extend_from_slice(value.as_bytes());
        let index = self.push(&entry);
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        entry.extend_from_slice(&name_index.to_be_bytes());
        let index = self.push(&entry);
        self.classes.insert(name.to_string(), index);
        index
    }

    fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) {
        let class_index = self.class(owner);
        let name_index = self.utf8(name);
        let desc_index = self.utf8(descriptor);

        let mut nat = vec![12];
        nat.extend_from_slice(&name_index.to_be_bytes());
        nat.extend_from_slice(&desc_index.to_be_bytes());
        let nat_index = self.push(&nat);

        let mut entry = vec![10];
        entry.extend_from_slice(&class_index.to_be_bytes());
        entry.extend_from_slice(&nat_index.to_be_bytes());
        self.push(&entry);
    }
}

/// Two related classes: `com/acme/Base` and `com/acme/Derived extends Base`.
pub fn write_sample_classes(root: &Path) {
    ClassBuilder::new("com/acme/Base")
        .method("<init>", "()V")
        .method("run", "()V")
        .write_to(root);
    ClassBuilder::new("com/acme/Derived")
        .extends("com/acme/Base")
        .method("<init>", "()V")
        .calls("com/acme/Base", "run", "()V")
        .write_to(root);
}
