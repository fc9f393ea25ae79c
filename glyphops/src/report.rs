//! Plain text recognition reports.
//!
//! Single character runs produce one comma-delimited record per image.
//! Line runs produce a tab-separated table with optional per-candidate lines.

use glyphops_rec::decoder::Candidate;
use glyphops_rec::types::{CharPrediction, LinePrediction, Prediction};

const RULE_WIDTH: usize = 80;

/// Render all predictions of a run.
///
/// `show_candidates` appends one line per candidate under each table row.
pub fn render(predictions: &[Prediction], single_char: bool, show_candidates: bool) -> String {
    let mut out = Vec::new();

    if !single_char {
        let rule = "-".repeat(RULE_WIDTH);
        out.push(rule.clone());
        out.push(format!(
            "{:<25}\t{:<25}\tconfidence score",
            "image_path", "predicted_labels"
        ));
        out.push(rule);
    }

    for prediction in predictions {
        match prediction {
            Prediction::Char(p) => out.push(char_record(p)),
            Prediction::Line(p) => {
                out.push(line_row(p));
                if show_candidates {
                    out.extend(p.candidates.iter().enumerate().map(|(i, c)| candidate_line(i, c)));
                }
            }
        }
    }

    let mut report = out.join("\n");
    report.push('\n');
    report
}

/// `image,char,0.1234,char,0.5678`
fn char_record(prediction: &CharPrediction) -> String {
    let mut record = prediction.image.clone();
    for (c, p) in prediction.chars.iter().zip(&prediction.probs) {
        record.push_str(&format!(",{c},{p:.4}"));
    }
    record
}

fn line_row(prediction: &LinePrediction) -> String {
    format!(
        "{:<25}\t{:<25}\t{:.4}",
        prediction.image, prediction.text, prediction.confidence
    )
}

fn candidate_line(rank: usize, candidate: &Candidate) -> String {
    let mut line = format!("Candidate {rank}: ");
    for (token, p) in candidate.tokens.iter().zip(&candidate.probs) {
        line.push_str(&format!("{token}, prob: {p:.4}\t"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(image: &str, text: &str, confidence: f32) -> Prediction {
        let tokens = text.chars().map(String::from).collect::<Vec<_>>();
        let probs = vec![0.9; tokens.len()];
        Prediction::Line(LinePrediction {
            image: image.to_string(),
            text: text.to_string(),
            confidence,
            candidates: vec![Candidate::new(tokens, probs)],
        })
    }

    #[test]
    fn renders_table_header_and_rows() {
        let report = render(&[line("demo_1.png", "available", 0.98766)], false, false);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "-".repeat(80));
        assert!(lines[1].starts_with("image_path               \tpredicted_labels"));
        assert!(lines[1].ends_with("\tconfidence score"));
        assert_eq!(lines[2], lines[0]);
        assert_eq!(
            lines[3],
            "demo_1.png               \tavailable                \t0.9877"
        );
    }

    #[test]
    fn renders_empty_run_as_header_only() {
        let report = render(&[], false, false);

        assert_eq!(report.lines().count(), 3);
    }

    #[test]
    fn renders_candidate_lines() {
        let report = render(&[line("a.png", "ok", 0.81)], false, true);
        let last = report.lines().last().unwrap();

        assert_eq!(last, "Candidate 0: o, prob: 0.9000\tk, prob: 0.9000\t");
    }

    #[test]
    fn renders_single_char_records() {
        let prediction = Prediction::Char(CharPrediction {
            image: "char.png".to_string(),
            chars: vec!["x".to_string(), "y".to_string()],
            probs: vec![0.75, 0.125],
        });

        let report = render(&[prediction], true, false);

        assert_eq!(report, "char.png,x,0.7500,y,0.1250\n");
    }
}
