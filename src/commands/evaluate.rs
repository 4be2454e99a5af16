use crate::cli::EvaluateArgs;
use crate::clustering::{compression_score, conditional_entropies};
use crate::utils::{read_label_table, ClusteringMetric, Result};

pub fn evaluate(args: EvaluateArgs) -> Result<()> {
    let (labels_true, labels_pred) =
        read_label_table(&args.labels_path, &args.true_column, &args.pred_column)?;
    log::info!(
        "Read {} labelled items from {}",
        labels_true.len(),
        args.labels_path.display()
    );
    println!("{}", render_metric(args.metric, &labels_true, &labels_pred)?);
    Ok(())
}

/// Formats the requested metric as printed on stdout: a bare score, or the
/// tab-separated joint, H(true|pred), H(pred|true), H(true) and H(pred).
fn render_metric(
    metric: ClusteringMetric,
    labels_true: &[String],
    labels_pred: &[String],
) -> Result<String> {
    match metric {
        ClusteringMetric::Compression => {
            Ok(compression_score(labels_true, labels_pred)?.to_string())
        }
        ClusteringMetric::Entropies => {
            let entropies = conditional_entropies(labels_true, labels_pred)?;
            Ok(format!(
                "{}\t{}\t{}\t{}\t{}",
                entropies.joint,
                entropies.true_given_pred,
                entropies.pred_given_true,
                entropies.true_marginal,
                entropies.pred_marginal
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::LN_2;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn entropies_print_five_fields_in_order() {
        let labels_true = labels(&["a", "a", "b", "b"]);
        let labels_pred = labels(&["x", "x", "x", "x"]);
        let line = render_metric(ClusteringMetric::Entropies, &labels_true, &labels_pred).unwrap();
        let fields = line
            .split('\t')
            .map(|f| f.parse::<f64>().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(fields.len(), 5);
        // joint, H(true|pred), H(pred|true), H(true), H(pred)
        let expected = [LN_2, LN_2, 0.0, LN_2, 0.0];
        for (value, e) in fields.iter().zip(expected) {
            assert_relative_eq!(*value, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn compression_prints_bare_score() {
        let labels_true = labels(&["a", "a", "b", "b"]);
        let line = render_metric(ClusteringMetric::Compression, &labels_true, &labels_true).unwrap();
        assert_relative_eq!(line.parse::<f64>().unwrap(), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn degenerate_labels_err() {
        let labels_true = labels(&["a", "b", "c"]);
        let result = render_metric(ClusteringMetric::Compression, &labels_true, &labels_true);
        assert!(result.unwrap_err().starts_with("Degenerate input"));
    }
}
