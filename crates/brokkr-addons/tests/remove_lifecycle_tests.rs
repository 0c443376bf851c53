//! Remove transaction integration tests: preconditions, host-tree cleanup,
//! the removal script, and migration rollback gating.

mod common;

use brokkr_addons::{InstallOptions, RemoveOptions};
use brokkr_core::Error;
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_remove_unknown_addon_is_a_precondition_failure() {
    let panel = PanelFixture::new();
    let mut engine = panel.engine();

    let err = engine
        .remove("ghost", &RemoveOptions::default())
        .await
        .unwrap_err();

    let core = err.downcast_ref::<Error>().unwrap();
    assert!(matches!(core, Error::NotInstalled { .. }));
    assert!(core.is_precondition());
}

#[tokio::test]
async fn test_remove_strips_css_and_deletes_record() {
    let panel = PanelFixture::new();
    let packages = TempDir::new().unwrap();
    let package = PackageBuilder::new("demo")
        .admin_css("body { margin: 0; }")
        .client_router("<?php\n")
        .public_file("index.html", "hello")
        .write_to(packages.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&package, &InstallOptions::default())
            .await
            .unwrap(),
    );

    let tag = "<link rel=\"stylesheet\" href=\"/assets/addons/demo/admin.css\">";
    assert!(panel.read("resources/views/layouts/admin.blade.php").contains(tag));

    expect_done(
        engine
            .remove("demo", &RemoveOptions::default())
            .await
            .unwrap(),
    );

    assert!(!panel.exists(".framework/extensions/demo"));
    assert!(!panel.read("resources/views/layouts/admin.blade.php").contains(tag));
    assert!(!panel
        .read("routes/api-client.php")
        .contains("include 'addons/client/demo.php';"));
    assert!(!panel.exists("routes/addons/client/demo.php"));
    assert!(!panel.exists("public/addons/demo"));
    assert!(!panel.exists("public/fs/addons/demo"));
    assert!(!panel.exists("resources/views/admin/addons/demo"));
    assert!(!panel.exists("app/Http/Controllers/Admin/Addons/demo"));
}

#[tokio::test]
async fn test_removal_script_runs_from_installed_copy() {
    let panel = PanelFixture::new();
    let packages = TempDir::new().unwrap();
    let package = PackageBuilder::new("demo")
        .flags("hasRemovalScript")
        .remove_script("remove.sh")
        .data_file("remove.sh", "#!/bin/bash\n")
        .write_to(packages.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&package, &InstallOptions::default())
            .await
            .unwrap(),
    );
    assert!(panel.spy.scripts().is_empty());

    expect_done(
        engine
            .remove("demo", &RemoveOptions::default())
            .await
            .unwrap(),
    );
    assert_eq!(panel.spy.scripts(), vec!["remove.sh".to_string()]);
}

#[tokio::test]
async fn test_migration_rollback_gated_by_flag() {
    let panel = PanelFixture::new();
    let packages = TempDir::new().unwrap();
    let package = PackageBuilder::new("demo")
        .migration("2024_01_01_000000_create_demo.php", "<?php\n")
        .write_to(packages.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&package, &InstallOptions::default())
            .await
            .unwrap(),
    );
    expect_done(
        engine
            .remove("demo", &RemoveOptions { migrate: false })
            .await
            .unwrap(),
    );
    assert_eq!(panel.spy.count("rollback_migrations"), 0);
    assert!(!panel.exists("database/migrations-demo"));

    expect_done(
        engine
            .install(&package, &InstallOptions::default())
            .await
            .unwrap(),
    );
    expect_done(
        engine
            .remove("demo", &RemoveOptions { migrate: true })
            .await
            .unwrap(),
    );
    assert_eq!(panel.spy.count("rollback_migrations"), 1);
}
