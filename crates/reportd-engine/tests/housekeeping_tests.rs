//! Temp sweep behaviour against real file timestamps.

mod common;

use common::Fixture;
use filetime::FileTime;
use reportd_engine::{list_templates, sweep_temp, sweep_temp_at};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const DAY: Duration = Duration::from_secs(24 * 3600);

fn write_aged(path: &Path, age: Duration) {
    std::fs::write(path, b"artifact").unwrap();
    let mtime = FileTime::from_system_time(SystemTime::now() - age);
    filetime::set_file_mtime(path, mtime).unwrap();
}

#[test]
fn test_sweep_deletes_only_expired_files() {
    let fx = Fixture::new().with_template("gross_with_vat");
    let temp = &fx.config.temp_dir;
    write_aged(&temp.join("old_report.pdf"), DAY + Duration::from_secs(60));
    write_aged(&temp.join("ancient.xlsx"), DAY * 7);
    write_aged(&temp.join("fresh.pdf"), Duration::from_secs(3600));

    let report = sweep_temp(temp, fx.config.retention()).unwrap();
    assert_eq!(report.deleted, 2);
    assert_eq!(report.retained, 1);
    assert_eq!(report.freed_bytes, 16);
    assert!(temp.join("fresh.pdf").exists());
    assert!(!temp.join("old_report.pdf").exists());
}

#[test]
fn test_second_sweep_is_a_no_op() {
    let fx = Fixture::new();
    let temp = &fx.config.temp_dir;
    write_aged(&temp.join("old.pdf"), DAY * 2);

    assert_eq!(sweep_temp(temp, fx.config.retention()).unwrap().deleted, 1);
    assert_eq!(sweep_temp(temp, fx.config.retention()).unwrap().deleted, 0);
}

#[test]
fn test_sweep_leaves_subdirectories_and_templates() {
    let fx = Fixture::new().with_template("gross_with_vat");
    let temp = &fx.config.temp_dir;
    let nested = temp.join("nested");
    std::fs::create_dir(&nested).unwrap();
    write_aged(&nested.join("deep.pdf"), DAY * 3);
    let three_days_ago = FileTime::from_system_time(SystemTime::now() - DAY * 3);
    filetime::set_file_mtime(&nested, three_days_ago).unwrap();

    let template = fx.config.reports_dir.join("gross_with_vat.jrxml");
    let month_ago = FileTime::from_system_time(SystemTime::now() - DAY * 30);
    filetime::set_file_mtime(&template, month_ago).unwrap();

    let report = sweep_temp(temp, fx.config.retention()).unwrap();
    assert_eq!(report.deleted, 0);
    assert!(nested.join("deep.pdf").exists());
    assert!(template.exists());
    assert_eq!(list_templates(&fx.config).unwrap().len(), 1);
}

#[test]
fn test_retention_cutoff_is_inclusive() {
    let fx = Fixture::new();
    let temp = &fx.config.temp_dir;
    let retention = fx.config.retention();
    let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let path = temp.join("edge.pdf");
    std::fs::write(&path, b"artifact").unwrap();
    filetime::set_file_mtime(&path, FileTime::from_system_time(written)).unwrap();

    let just_before = written + retention - Duration::from_secs(1);
    let report = sweep_temp_at(temp, retention, just_before).unwrap();
    assert_eq!((report.deleted, report.retained), (0, 1));
    assert!(path.exists());

    let report = sweep_temp_at(temp, retention, written + retention).unwrap();
    assert_eq!((report.deleted, report.retained), (1, 0));
    assert!(!path.exists());
}

#[test]
fn test_sweep_tolerates_files_deleted_underneath_it() {
    let fx = Fixture::new();
    let temp = fx.config.temp_dir.clone();
    for i in 0..50 {
        write_aged(&temp.join(format!("old_{}.pdf", i)), DAY * 2);
    }

    // Served downloads and the connection check delete files at any time.
    let stop = Arc::new(AtomicBool::new(false));
    let churn = {
        let temp = temp.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            let mut n = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let path = temp.join(format!("r_{}.pdf", n % 16));
                let _ = std::fs::write(&path, b"x");
                let _ = std::fs::remove_file(&path);
                n += 1;
            }
        })
    };

    let results: Vec<_> = (0..500).map(|_| sweep_temp(&temp, fx.config.retention())).collect();
    stop.store(true, Ordering::Relaxed);
    churn.join().unwrap();

    for result in results {
        result.unwrap();
    }
    let leftover_old = std::fs::read_dir(&temp)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with("old_"))
        .count();
    assert_eq!(leftover_old, 0);
}
