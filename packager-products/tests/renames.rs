// SPDX-License-Identifier: GPL-3.0-only

use packager_products::{ProductRenameResolver, RemovalSeverity};
use packager_testing::{EngineFixture, FakeEngine};
use packager_types::{ProductRef, ProductStatus, TransactBy};

const UPGRADE_FIXTURE: &str = r#"
[[products]]
name = "sle-hae"
version = "11.4"
status = "removed"
transact_by = "solver"

[[products]]
name = "sle-ha"
version = "12"
status = "selected"
product_package = "sle-ha-release"

[[products]]
name = "sle-sdk"
version = "11.4"
status = "removed"
transact_by = "solver"

[[products]]
name = "sle-module-web"
version = "12"
status = "selected"
product_package = "sle-module-web-release"

[packages.sle-ha-release]
obsoletes = ["product:sle-hae < 12"]
provides = ["product(sle-ha) = 12"]

[packages.sle-module-web-release]
provides = ["product(sle-module-web) = 12"]
"#;

#[test]
fn shipped_renames_need_no_registration() {
    let resolver = ProductRenameResolver::new(FakeEngine::new());
    assert!(resolver.renamed("SUSE_SLES", "SLES"));
    assert!(resolver.renamed_by_default("SUSE_SLES", "SLES"));
    assert!(!resolver.renamed_externally("SUSE_SLES", "SLES"));
    assert!(!resolver.renamed_by_engine("SUSE_SLES", "SLES"));
}

#[test]
fn registered_rename_survives_engine_changes() {
    let mut resolver = ProductRenameResolver::new(FakeEngine::new());
    resolver.add_rename("A", "B");

    for round in 0..3 {
        let products = vec![
            ProductRef::new(format!("P{round}"), "1", ProductStatus::Selected)
                .with_package("p-release"),
        ];
        resolver.engine_mut().set_products(products);
        assert!(resolver.renamed("A", "B"), "round {round}");
    }

    resolver.add_rename("A", "B");
    assert_eq!(resolver.external_renames().len(), 1);
    assert_eq!(resolver.renames_for("A"), vec!["B"]);
}

#[test]
fn engine_table_is_recomputed_on_every_lookup() {
    let engine = FakeEngine::new()
        .with_product(
            ProductRef::new("SLES", "15", ProductStatus::Selected).with_package("sles-release"),
        )
        .with_product_package("sles-release", &["product:SLES_SAP"], &[]);
    let mut resolver = ProductRenameResolver::new(engine);

    assert!(resolver.renamed("SLES_SAP", "SLES"));
    assert!(resolver.renamed("SLES_SAP", "SLES"));
    assert_eq!(resolver.engine().product_queries(), 2);

    // the product is gone from the engine, so is the rename it declared
    resolver.engine_mut().set_products(Vec::new());
    assert!(!resolver.renamed("SLES_SAP", "SLES"));
}

#[test]
fn external_renames_win_without_asking_the_engine() {
    let mut resolver = ProductRenameResolver::new(FakeEngine::new());
    resolver.add_rename("old", "new");

    assert!(resolver.renamed("old", "new"));
    assert_eq!(resolver.engine().product_queries(), 0);
}

#[test]
fn classifies_pending_product_changes() {
    let engine = EngineFixture::from_toml_str(UPGRADE_FIXTURE)
        .unwrap()
        .into_engine();
    let resolver = ProductRenameResolver::new(engine);

    let changes = resolver.product_changes().unwrap();

    assert_eq!(changes.updates.len(), 1);
    assert_eq!(changes.updates[0].old.name, "sle-hae");
    assert_eq!(changes.updates[0].new.name, "sle-ha");

    let installs: Vec<_> = changes.new_installs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(installs, vec!["sle-module-web"]);

    assert_eq!(changes.removals.len(), 1);
    assert_eq!(changes.removals[0].product.name, "sle-sdk");
    assert_eq!(changes.removals[0].product.transact_by, TransactBy::Solver);
    assert_eq!(changes.removals[0].severity, RemovalSeverity::Warning);
}

#[test]
fn unavailable_engine_fails_classification() {
    let resolver = ProductRenameResolver::new(FakeEngine::new().unavailable());
    assert!(resolver.product_changes().is_err());
}
