mod common;

use chrono::Datelike;
use common::{TestWorkspace, raw_row, stamp};
use encoding_rs::UTF_8;
use fuel_sales_etl::error::PipelineError;
use fuel_sales_etl::month;
use fuel_sales_etl::normalize::{normalize, normalize_at};
use fuel_sales_etl::sources::{read_canonical, read_raw_rows, write_canonical};
use proptest::prelude::*;

const RAW_DATASET: &str = "\
ANO;MÊS;GRANDE REGIÃO;UNIDADE DA FEDERAÇÃO;PRODUTO;VENDAS
2012;JAN;REGIÃO SUDESTE;SP;GASOLINA C;100,5
2013;FEV; REGIÃO SUDESTE ; SP ;ETANOL HIDRATADO;2,25
;;;;;
2013;JAN;REGIÃO NORDESTE;BA;ETANOL HIDRATADO;0
2013;JAN;REGIÃO NORDESTE;AL;ETANOL HIDRATADO;10
";

#[test]
fn min_year_filter_keeps_boundary_year() {
    let rows = vec![
        raw_row(2012, "JAN", "SP", "DIESEL", "1"),
        raw_row(2013, "JAN", "SP", "DIESEL", "2"),
    ];
    let records = normalize_at(&rows, 2013, stamp()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].period.year(), 2013);
    assert_eq!(records[0].volume, 2.0);
}

#[test]
fn normalizing_twice_matches_except_timestamp() {
    let rows = vec![
        raw_row(2020, "MAR", "RJ", "GLP", "3,5"),
        raw_row(2020, "JAN", "SP", "GLP", "1,25"),
        raw_row(2021, "DEZ", "MG", "QUEROSENE", "0"),
    ];
    let first = normalize(&rows, 2000).unwrap();
    let second = normalize(&rows, 2000).unwrap();
    assert_eq!(first.len(), second.len());
    for (left, right) in first.iter().zip(&second) {
        assert!(left.same_observation(right), "{left:?} vs {right:?}");
    }
}

#[test]
fn canonical_file_is_byte_identical_for_same_stamp() {
    let workspace = TestWorkspace::new();
    let rows = vec![
        raw_row(2020, "MAR", "RJ", "GLP", "3,5"),
        raw_row(2020, "JAN", "SP", "GLP", "1,25"),
    ];
    let first_path = workspace.path().join("first.csv");
    let second_path = workspace.path().join("second.csv");
    write_canonical(&first_path, &normalize_at(&rows, 2000, stamp()).unwrap(), b';').unwrap();
    write_canonical(&second_path, &normalize_at(&rows, 2000, stamp()).unwrap(), b';').unwrap();
    let first = std::fs::read(&first_path).unwrap();
    let second = std::fs::read(&second_path).unwrap();
    assert_eq!(first, second);
    let text = String::from_utf8(first).unwrap();
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "year_month;uf;product;unit;volume;created_at",
            "2020-01-01;SP;GLP;m3;1.25;2022-07-01 09:15:00",
            "2020-03-01;RJ;GLP;m3;3.5;2022-07-01 09:15:00",
        ]
    );
}

#[test]
fn raw_dataset_reads_trims_and_skips_blank_lines() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("dataset_diesel.csv", RAW_DATASET);
    let rows = read_raw_rows(&path, b';', UTF_8).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].administrative_unit, "SP");
    assert_eq!(rows[1].source_line, 3);

    let records = normalize_at(&rows, 2013, stamp()).unwrap();
    let summary: Vec<(String, String, f64)> = records
        .iter()
        .map(|r| {
            (
                r.period.format("%Y-%m").to_string(),
                r.administrative_unit.clone(),
                r.volume,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("2013-01".to_string(), "AL".to_string(), 10.0),
            ("2013-01".to_string(), "BA".to_string(), 0.0),
            ("2013-02".to_string(), "SP".to_string(), 2.25),
        ]
    );
}

#[test]
fn malformed_year_names_the_line() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "bad.csv",
        "ANO;MÊS;REGIÃO;UF;PRODUTO;VENDAS\n2020;JAN;S;SP;GLP;1\n20x1;JAN;S;SP;GLP;1\n",
    );
    let err = read_raw_rows(&path, b';', UTF_8).unwrap_err();
    let domain = err
        .downcast_ref::<PipelineError>()
        .expect("domain error preserved");
    assert_eq!(
        domain,
        &PipelineError::MalformedYear {
            line: 3,
            text: "20x1".into()
        }
    );
}

#[test]
fn raw_row_with_extra_field_is_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "shifted.csv",
        "ANO;MÊS;REGIÃO;UF;PRODUTO;VENDAS\n2020;JAN;S;SP;GLP;1\n2020;FEV;S;SP;GLP;EXTRA;2\n",
    );
    let err = read_raw_rows(&path, b';', UTF_8).unwrap_err();
    assert!(
        err.to_string().contains("Line 3") && err.to_string().contains("has 7 field(s), expected 6"),
        "{err:#}"
    );
}

#[test]
fn empty_volume_is_an_error_not_a_drop() {
    let rows = vec![raw_row(2020, "JAN", "SP", "GLP", "")];
    let err = normalize_at(&rows, 2000, stamp()).unwrap_err();
    assert!(matches!(err, PipelineError::MalformedVolume { .. }));
}

#[test]
fn canonical_file_round_trips_through_reader() {
    let workspace = TestWorkspace::new();
    let rows = vec![
        raw_row(2020, "JAN", "SP", "GLP", "1234,567"),
        raw_row(2021, "OUT", "AM", "ÓLEO COMBUSTÍVEL", "7"),
    ];
    let records = normalize_at(&rows, 2000, stamp()).unwrap();
    let path = workspace.path().join("canonical.csv");
    write_canonical(&path, &records, b';').unwrap();
    let dataset = read_canonical(&path, "derivative", b';').unwrap();
    assert_eq!(dataset.records, records);
}

proptest! {
    #[test]
    fn month_labels_round_trip_through_period(year in 2000i32..2030, month_idx in 0usize..12, full in any::<bool>()) {
        let label = if full {
            month::full_names()[month_idx].to_string()
        } else {
            month::abbreviations().nth(month_idx).unwrap().to_string()
        };
        let rows = vec![raw_row(year, &label, "SP", "GLP", "1")];
        let records = normalize_at(&rows, 2000, stamp()).unwrap();
        prop_assert_eq!(records.len(), 1);
        let period = records[0].period;
        prop_assert_eq!((period.year(), period.month(), period.day()), (year, month_idx as u32 + 1, 1));
    }
}
