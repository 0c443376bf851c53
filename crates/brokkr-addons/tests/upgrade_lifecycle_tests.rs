//! Upgrade transaction integration tests covering the three-way branch:
//! addon-supplied update script, in-place reinstall, full remove-reinstall.

mod common;

use brokkr_addons::{InstallOptions, UpgradeOptions};
use brokkr_core::Error;
use common::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_upgrade_requires_an_installed_addon() {
    let panel = PanelFixture::new();
    let packages = TempDir::new().unwrap();
    let package = PackageBuilder::new("demo").write_to(packages.path());

    let mut engine = panel.engine();
    let err = engine
        .upgrade(&package, &UpgradeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NotInstalled { .. })
    ));
}

#[tokio::test]
async fn test_skip_remove_on_upgrade_never_runs_the_remove_phase() {
    let panel = PanelFixture::new();
    let v1_dir = TempDir::new().unwrap();
    let v2_dir = TempDir::new().unwrap();

    let v1 = PackageBuilder::new("demo")
        .version("1.0.0")
        .flags("hasRemovalScript")
        .remove_script("remove.sh")
        .data_file("remove.sh", "#!/bin/bash\n")
        .write_to(v1_dir.path());
    let v2 = PackageBuilder::new("demo")
        .version("2.0.0")
        .flags("hasRemovalScript")
        .remove_script("remove.sh")
        .data_file("remove.sh", "#!/bin/bash\n")
        .skip_remove_on_upgrade()
        .write_to(v2_dir.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&v1, &InstallOptions::default())
            .await
            .unwrap(),
    );
    expect_done(
        engine
            .upgrade(&v2, &UpgradeOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(panel.spy.count("run_addon_script"), 0);
    assert!(panel
        .read(".framework/extensions/demo/private/conf.yml")
        .contains("2.0.0"));
}

#[tokio::test]
async fn test_full_upgrade_removes_then_reinstalls() {
    let panel = PanelFixture::new();
    let v1_dir = TempDir::new().unwrap();
    let v2_dir = TempDir::new().unwrap();

    let v1 = PackageBuilder::new("demo")
        .version("1.0.0")
        .flags("hasRemovalScript")
        .remove_script("remove.sh")
        .data_file("remove.sh", "#!/bin/bash\n")
        .public_file("index.html", "one")
        .write_to(v1_dir.path());
    let v2 = PackageBuilder::new("demo")
        .version("2.0.0")
        .public_file("index.html", "two")
        .write_to(v2_dir.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&v1, &InstallOptions::default())
            .await
            .unwrap(),
    );
    expect_done(
        engine
            .upgrade(&v2, &UpgradeOptions::default())
            .await
            .unwrap(),
    );

    assert_eq!(panel.spy.scripts(), vec!["remove.sh".to_string()]);
    assert_eq!(panel.read("public/addons/demo/index.html"), "two");
    assert!(panel.exists(".framework/extensions/demo/demo.package"));
}

#[tokio::test]
async fn test_upgrade_prefers_the_addon_update_script() {
    let panel = PanelFixture::new();
    let v1_dir = TempDir::new().unwrap();
    let v2_dir = TempDir::new().unwrap();

    let v1 = PackageBuilder::new("demo")
        .version("1.0.0")
        .flags("hasRemovalScript")
        .remove_script("remove.sh")
        .data_file("remove.sh", "#!/bin/bash\n")
        .public_file("index.html", "one")
        .write_to(v1_dir.path());
    let v2 = PackageBuilder::new("demo")
        .version("2.0.0")
        .data_file("update.sh", "#!/bin/bash\n")
        .public_file("index.html", "two")
        .write_to(v2_dir.path());

    let mut engine = panel.engine();
    expect_done(
        engine
            .install(&v1, &InstallOptions::default())
            .await
            .unwrap(),
    );
    expect_done(
        engine
            .upgrade(&v2, &UpgradeOptions::default())
            .await
            .unwrap(),
    );

    // the update script stands in for the removal half only; the
    // install half still runs and lands the new bundle
    assert_eq!(panel.spy.scripts(), vec!["update.sh".to_string()]);
    assert_eq!(panel.read("public/addons/demo/index.html"), "two");
    assert!(panel
        .read(".framework/extensions/demo/private/conf.yml")
        .contains("2.0.0"));
}
