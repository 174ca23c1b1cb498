//! Identification from recording files on disk.

use std::io::Write;

use approx::assert_abs_diff_eq;
use joint_axes::math::{rot_angle_axis, rpy_from_rotation};
use joint_axes::{
    identify_joint_axes, load_samples, IdentConfig, IdentError, ReaderOptions, RpyOrder,
};
use nalgebra::{Matrix3, Vector3};
use tempfile::NamedTempFile;

fn axes() -> [Vector3<f64>; 2] {
    [Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.6, 0.8, 0.0)]
}

const SCHEDULE: [[f64; 2]; 5] = [[0.0, 0.0], [0.6, 0.0], [0.6, -0.4], [1.3, -0.4], [1.3, 0.5]];

fn orientation(q: &[f64; 2]) -> (f64, f64, f64) {
    let rot = axes()
        .iter()
        .zip(q)
        .fold(Matrix3::<f64>::identity(), |r, (h, &a)| r * rot_angle_axis(a, h));
    rpy_from_rotation(&rot, RpyOrder::Reverse)
}

#[test]
fn test_space_separated_recording() {
    let mut file = NamedTempFile::new().unwrap();
    for q in &SCHEDULE {
        let (roll, pitch, yaw) = orientation(q);
        writeln!(file, "{:.17}   {:.17}\t{roll:.17} {pitch:.17} {yaw:.17}", q[0], q[1]).unwrap();
    }
    writeln!(file).unwrap();
    writeln!(file, "# recorder stopped").unwrap();
    file.flush().unwrap();

    let table = load_samples(file.path(), 2, &ReaderOptions::default()).unwrap();
    assert_eq!(table.n_rows(), SCHEDULE.len());

    let report = identify_joint_axes(&table, &IdentConfig::default()).unwrap();
    let matrix = report.axes().unwrap();
    for (joint, expected) in axes().iter().enumerate() {
        assert_abs_diff_eq!(matrix.column(joint).into_owned(), *expected, epsilon = 1e-9);
    }
}

#[test]
fn test_csv_recording_with_timestamp_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "time,q0,q1,roll,pitch,yaw").unwrap();
    for (i, q) in SCHEDULE.iter().enumerate() {
        let (roll, pitch, yaw) = orientation(q);
        writeln!(
            file,
            "{:.2},{:.17},{:.17},{roll:.17},{pitch:.17},{yaw:.17}",
            i as f64 * 0.01,
            q[0],
            q[1]
        )
        .unwrap();
    }
    file.flush().unwrap();

    let options = ReaderOptions::default()
        .with_delimiter(b',')
        .with_header_lines(1)
        .with_skip_columns(vec![0]);
    let table = load_samples(file.path(), 2, &options).unwrap();
    let report = identify_joint_axes(&table, &IdentConfig::default()).unwrap();
    assert!(report.agreement.unwrap().agrees);
}

#[test]
fn test_wrong_joint_count() {
    let mut file = NamedTempFile::new().unwrap();
    for q in &SCHEDULE {
        let (roll, pitch, yaw) = orientation(q);
        writeln!(file, "{} {} {roll} {pitch} {yaw}", q[0], q[1]).unwrap();
    }
    file.flush().unwrap();

    let err = load_samples(file.path(), 3, &ReaderOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        IdentError::ColumnMismatch {
            expected: 6,
            actual: 5,
            ..
        }
    ));
    assert!(err.is_malformed_input());
}
