//! Loader for the SVM-light / LibSVM sparse text format.
//!
//! Each record reads `<label> [qid:<id>] <index>:<value> ... [# comment]`. Indices are
//! zero-based when any record uses index `0` and one-based otherwise. Records are
//! densified, padded to at least `min_size` columns, and labels are remapped to
//! `[0, k)` by rank.

use super::{class_index, Dataset};

use crate::errors::DatasetError;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Largest feature index a record may use. Rows are stored densely, so wider
/// indices could never be materialized.
pub const MAX_FEATURE_INDEX: usize = (1 << 24) - 1;

struct Record {
    line: usize,
    label: i64,
    features: Vec<(usize, f64)>,
}

pub fn load<P: AsRef<Path>>(path: P, min_size: usize) -> Result<Dataset, DatasetError> {
    load_from(path.as_ref(), min_size, None)
}

/// Loads a data set whose labels must belong to `classes`, typically a test set
/// sharing the label mapping of its training set.
pub fn load_with_classes<P: AsRef<Path>>(
    path: P,
    min_size: usize,
    classes: &[i64],
) -> Result<Dataset, DatasetError> {
    load_from(path.as_ref(), min_size, Some(classes))
}

fn load_from(
    path: &Path,
    min_size: usize,
    classes: Option<&[i64]>,
) -> Result<Dataset, DatasetError> {
    let reader = BufReader::new(File::open(path)?);
    let dataset = parse(reader, min_size, classes)?;
    info!(
        path = ?path,
        n = dataset.n(),
        d = dataset.d(),
        k = dataset.k(),
        "Loaded data set"
    );

    Ok(dataset)
}

pub fn parse<R: BufRead>(
    reader: R,
    min_size: usize,
    classes: Option<&[i64]>,
) -> Result<Dataset, DatasetError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        if let Some(record) = parse_line(i + 1, &line?)? {
            records.push(record);
        }
    }

    let zero_based = records
        .iter()
        .any(|record| record.features.iter().any(|&(index, _)| index == 0));
    let offset = if zero_based { 0 } else { 1 };
    let width = records
        .iter()
        .filter_map(|record| record.features.last())
        .map(|&(index, _)| index + 1 - offset)
        .max()
        .unwrap_or(0);
    let d = width.max(min_size);
    debug!(zero_based, width, d, "Densifying records");

    let last_line = records.last().map_or(0, |record| record.line);
    let too_large = || DatasetError::Parse {
        line: last_line,
        message: format!("{} rows of width {} do not fit in memory", records.len(), d),
    };
    let cells = records.len().checked_mul(d).ok_or_else(too_large)?;
    let mut xs = Vec::new();
    xs.try_reserve_exact(cells).map_err(|_| too_large())?;
    xs.resize(cells, 0.0);

    let classes = match classes {
        Some(classes) => classes.to_vec(),
        None => {
            let mut classes = records.iter().map(|r| r.label).collect::<Vec<_>>();
            classes.sort_unstable();
            classes.dedup();
            classes
        }
    };

    let mut ys = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        let label = class_index(&classes, record.label).ok_or_else(|| DatasetError::Parse {
            line: record.line,
            message: format!("label {} is not a known class", record.label),
        })?;
        ys.push(label);

        for &(index, value) in &record.features {
            xs[row * d + index - offset] = value;
        }
    }

    Ok(Dataset::from_parts(xs, ys, classes, d))
}

fn parse_line(line: usize, text: &str) -> Result<Option<Record>, DatasetError> {
    let content = text.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let error = |message: String| DatasetError::Parse { line, message };

    let mut tokens = content.split_whitespace();
    let label = tokens
        .next()
        .ok_or_else(|| error("missing label".to_string()))
        .and_then(|token| {
            parse_label(token).ok_or_else(|| error(format!("invalid label '{}'", token)))
        })?;

    let mut features: Vec<(usize, f64)> = Vec::new();
    for token in tokens {
        let (key, value) = token
            .split_once(':')
            .ok_or_else(|| error(format!("expected '<index>:<value>', got '{}'", token)))?;

        if key == "qid" {
            value
                .parse::<u64>()
                .map_err(|_| error(format!("invalid query id '{}'", value)))?;
            continue;
        }

        let index = key
            .parse::<usize>()
            .map_err(|_| error(format!("invalid feature index '{}'", key)))?;
        if index > MAX_FEATURE_INDEX {
            return Err(error(format!(
                "feature index {} exceeds {}",
                index, MAX_FEATURE_INDEX
            )));
        }
        let value = value
            .parse::<f64>()
            .map_err(|_| error(format!("invalid feature value '{}'", value)))?;

        if let Some(&(previous, _)) = features.last() {
            if index <= previous {
                return Err(error(format!(
                    "feature indices must be strictly increasing, got {} after {}",
                    index, previous
                )));
            }
        }
        features.push((index, value));
    }

    Ok(Some(Record {
        line,
        label,
        features,
    }))
}

fn parse_label(token: &str) -> Option<i64> {
    let value = token.parse::<f64>().ok()?;
    // i64::MAX as f64 rounds up to 2^63, hence the strict bound
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    if in_range && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse_str(text: &str, min_size: usize) -> Result<Dataset, DatasetError> {
        parse(Cursor::new(text), min_size, None)
    }

    #[test]
    fn parse_one_based() {
        let dataset = parse_str("1 1:0.5 3:2\n2 2:1\n", 0).unwrap();
        assert_eq!((dataset.n(), dataset.d(), dataset.k()), (2, 3, 2));

        let (context, label) = dataset.get(0).unwrap();
        assert_eq!(context.values(), &[0.5, 0.0, 2.0]);
        assert_eq!(label, 0);

        let (context, label) = dataset.get(1).unwrap();
        assert_eq!(context.values(), &[0.0, 1.0, 0.0]);
        assert_eq!(label, 1);
    }

    #[test]
    fn parse_zero_based() {
        let dataset = parse_str("0 0:1 2:1\n1 1:3\n", 0).unwrap();
        assert_eq!(dataset.d(), 3);
        assert_eq!(dataset.get(0).unwrap().0.values(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn pads_to_min_size() {
        let dataset = parse_str("1 1:1\n", 4).unwrap();
        assert_eq!(dataset.d(), 4);
        assert_eq!(dataset.get(0).unwrap().0.values(), &[1.0, 0.0, 0.0, 0.0]);

        // never truncates
        let dataset = parse_str("1 3:1\n", 2).unwrap();
        assert_eq!(dataset.d(), 3);
    }

    #[test]
    fn remaps_signed_labels() {
        let dataset = parse_str("-1 1:1\n+1 1:2\n-1 1:3\n", 0).unwrap();
        assert_eq!(dataset.labels(), &[0, 1, 0]);
        assert_eq!(dataset.classes(), &[-1, 1]);
    }

    #[test]
    fn skips_comments_blank_lines_and_qid() {
        let dataset = parse_str("# header\n\n3 qid:7 1:1 # trailing\n", 0).unwrap();
        assert_eq!(dataset.n(), 1);
        assert_eq!(dataset.d(), 1);
    }

    #[test]
    fn empty_input() {
        let dataset = parse_str("", 5).unwrap();
        assert_eq!((dataset.n(), dataset.d(), dataset.k()), (0, 5, 0));
    }

    #[test]
    fn malformed_records() {
        for text in [
            "abc 1:1\n",
            "1.5 1:1\n",
            "1 1-1\n",
            "1 x:1\n",
            "1 1:y\n",
            "1 2:1 1:1\n",
            "1 1:1 1:2\n",
        ] {
            assert!(
                matches!(parse_str(text, 0), Err(DatasetError::Parse { line: 1, .. })),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn rejects_oversized_feature_index() {
        let just_past = format!("1 {}:1\n", MAX_FEATURE_INDEX + 1);
        for text in [
            "1 18446744073709551615:1\n",
            "1 1:1 100000000000:1\n",
            just_past.as_str(),
        ] {
            assert!(
                matches!(parse_str(text, 0), Err(DatasetError::Parse { line: 1, .. })),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn rejects_dense_overflow() {
        let result = parse_str("1 1:1\n2 1:1\n", usize::MAX);
        assert!(matches!(result, Err(DatasetError::Parse { line: 2, .. })));
    }

    #[test]
    fn rejects_labels_outside_i64() {
        for text in ["1e19 1:1\n", "-1e19 1:1\n", "inf 1:1\n"] {
            assert!(
                matches!(parse_str(text, 0), Err(DatasetError::Parse { line: 1, .. })),
                "accepted {:?}",
                text
            );
        }

        let dataset = parse_str("1e18 1:1\n-1e18 1:1\n", 0).unwrap();
        assert_eq!(
            dataset.classes(),
            &[-1_000_000_000_000_000_000, 1_000_000_000_000_000_000]
        );
    }

    #[test]
    fn reports_line_number() {
        let result = parse_str("1 1:1\n\n2 1:oops\n", 0);
        assert!(matches!(result, Err(DatasetError::Parse { line: 3, .. })));
    }

    #[test]
    fn shared_classes() {
        let classes = [1, 2, 3];
        let dataset = parse(Cursor::new("3 1:1\n2 1:1\n"), 0, Some(&classes[..])).unwrap();
        assert_eq!(dataset.labels(), &[2, 1]);
        assert_eq!(dataset.k(), 3);

        let result = parse(Cursor::new("4 1:1\n"), 0, Some(&classes[..]));
        assert!(matches!(result, Err(DatasetError::Parse { line: 1, .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 1:1 2:1").unwrap();
        writeln!(file, "2 2:1").unwrap();

        let train = load(file.path(), 0).unwrap();
        let test = load_with_classes(file.path(), 5, train.classes()).unwrap();
        assert_eq!(train.d(), 2);
        assert_eq!(test.d(), 5);
        assert_eq!(test.labels(), train.labels());
    }

    #[test]
    fn load_missing_file() {
        assert!(matches!(
            load("/nonexistent/train.svm", 0),
            Err(DatasetError::Io(_))
        ));
    }
}
