#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tabform::catalog::{RawColumnDef, ReferenceChoice, StaticCatalog};
use tabform::metadata::{CatalogMetadata, ColumnMetadata};
use tempfile::{TempDir, tempdir};

/// Catalog columns of the `orders.yaml` fixture, in order.
pub const ORDER_COLUMNS: [&str; 7] = [
    "Customer", "Status", "Reason", "Quantity", "Rush", "Tags", "Watchers",
];

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// In-memory twin of the `orders.yaml` fixture.
pub fn orders_catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        RawColumnDef::new("manualSort", "ManualSortPos"),
        RawColumnDef::new("Customer", "Ref:Customers"),
        RawColumnDef::new("Status", "Choice")
            .with_widget_options(r#"{"choices": ["open", "closed"]}"#),
        RawColumnDef::new("Reason", "Text"),
        RawColumnDef::new("Quantity", "Int"),
        RawColumnDef::new("Rush", "Bool"),
        RawColumnDef::new("Tags", "ChoiceList")
            .with_widget_options(r#"{"choices": ["fragile", "gift"]}"#),
        RawColumnDef::new("Watchers", "RefList:Customers"),
    ])
    .with_reference_table(
        "Customers",
        vec![
            ReferenceChoice {
                id: 1,
                label: "Acme".to_string(),
            },
            ReferenceChoice {
                id: 3,
                label: "Globex".to_string(),
            },
            ReferenceChoice {
                id: 7,
                label: "Initech".to_string(),
            },
        ],
    )
}

/// Metadata for a small form: a choice, a reference, a text and an int.
pub fn sample_metadata() -> CatalogMetadata {
    [
        (
            "Status".to_string(),
            ColumnMetadata::new("Choice").with_choices(["open", "closed"]),
        ),
        (
            "Owner".to_string(),
            ColumnMetadata::new("Ref:People").with_ref_choices(vec![
                ReferenceChoice {
                    id: 3,
                    label: "Ada".to_string(),
                },
                ReferenceChoice {
                    id: 4,
                    label: "Grace".to_string(),
                },
            ]),
        ),
        ("Reason".to_string(), ColumnMetadata::new("Text")),
        ("Count".to_string(), ColumnMetadata::new("Int")),
    ]
    .into_iter()
    .collect()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies the orders document into the workspace.
    pub fn orders_document(&self) -> PathBuf {
        let contents = fs::read_to_string(fixture_path("orders.yaml")).expect("read fixture");
        self.write("orders.yaml", &contents)
    }

    pub fn options_path(&self) -> PathBuf {
        self.temp_dir.path().join("options.json")
    }

    pub fn records_path(&self) -> PathBuf {
        self.temp_dir.path().join("records.csv")
    }
}
