//! Output of one run: a two-row tab-separated table or a JSON document

use crate::index::label_name;
use crate::pipeline::BuildReport;
use crate::settings::Settings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Everything printed at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub settings: &'a Settings,
    /// Description of the transformer actually built
    pub method: &'a str,
    pub report: &'a BuildReport,
    pub statistics: &'a BTreeMap<String, f64>,
}

impl RunSummary<'_> {
    /// Header row, then value row. Statistics columns are named after their label without
    /// the rank, in rank order.
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut header = vec![
            "#XP".to_string(),
            "Length".to_string(),
            "PrefixLength".to_string(),
            "Method".to_string(),
            "Time(ms)".to_string(),
            "NbFiles".to_string(),
        ];
        let mut values = vec![
            self.settings.tag.clone(),
            self.settings.kmer_length.to_string(),
            self.settings.prefix_length.to_string(),
            self.method.to_string(),
            self.report.elapsed_ms().to_string(),
            self.report.collectors.len().to_string(),
        ];

        for (i, collector) in self.report.collectors.iter().enumerate() {
            let file = i + 1;
            header.push(format!("File_{}_LCP_nb_values", file));
            header.push(format!("File_{}_LCP_avg", file));
            header.push(format!("File_{}_LCP_var", file));
            let lcp = collector.lcp.unwrap_or_default();
            values.push(lcp.nb_values.to_string());
            values.push(lcp.average.to_string());
            values.push(lcp.variance.to_string());
        }

        for (label, value) in self.statistics {
            header.push(label_name(label).to_string());
            values.push(value.to_string());
        }

        writeln!(out, "{}", header.join("\t"))?;
        writeln!(out, "{}", values.join("\t"))
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out).map_err(serde_json::Error::io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::statistics_from_sizes;
    use crate::pipeline::{CollectorReport, LcpSummary};
    use std::time::Duration;

    fn build_report() -> BuildReport {
        BuildReport {
            elapsed: Duration::from_millis(42),
            processors: 3,
            collectors: vec![
                CollectorReport {
                    id: 1,
                    source: "a.fa".to_string(),
                    nb_sequences: 1,
                    nb_kmers: 5,
                    lcp: Some(LcpSummary {
                        nb_values: 4,
                        average: 2.5,
                        variance: 1.25,
                    }),
                },
                CollectorReport {
                    id: 2,
                    source: "b.fa".to_string(),
                    nb_sequences: 0,
                    nb_kmers: 0,
                    lcp: None,
                },
            ],
            nb_processed: 5,
            nb_inserted: 4,
            queue: None,
        }
    }

    #[test]
    fn test_tsv_layout() {
        let settings = Settings {
            tag: "xp1".to_string(),
            kmer_length: 5,
            prefix_length: 2,
            ..Settings::default()
        };
        let report = build_report();
        let statistics = statistics_from_sizes(&[1, 0, 3, 0], 2);
        let summary = RunSummary {
            settings: &settings,
            method: "Identity",
            report: &report,
            statistics: &statistics,
        };

        let mut out = Vec::new();
        summary.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), rows[1].len());
        assert_eq!(
            &rows[0][..9],
            &["#XP", "Length", "PrefixLength", "Method", "Time(ms)", "NbFiles", "File_1_LCP_nb_values", "File_1_LCP_avg", "File_1_LCP_var"]
        );
        assert_eq!(&rows[1][..9], &["xp1", "5", "2", "Identity", "42", "2", "4", "2.5", "1.25"]);
        assert_eq!(&rows[1][9..12], &["0", "0", "0"]);
        assert_eq!(&rows[0][12..], &["min", "med", "max", "mean", "var", "bin_size", "bin_1", "bin_2"]);
        assert_eq!(&rows[1][12..], &["0", "1", "3", "1", "1.5", "2", "0", "4"]);
    }

    #[test]
    fn test_json_document() {
        let settings = Settings::default();
        let report = build_report();
        let statistics = statistics_from_sizes(&[1, 2], 1);
        let summary = RunSummary {
            settings: &settings,
            method: "Cyclic",
            report: &report,
            statistics: &statistics,
        };
        let mut out = Vec::new();
        summary.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["method"], "Cyclic");
        assert_eq!(value["settings"]["kmer_length"], 21);
        assert_eq!(value["report"]["collectors"][0]["lcp"]["average"], 2.5);
        assert_eq!(value["statistics"]["03 max"], 2.0);
    }
}
