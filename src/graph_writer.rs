//! GEXF and GraphML export of the region graph.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::grr_graph::{GrrGraph, Metric, NodeAttributes};
use crate::rgp_similarity::EdgeMetrics;

#[derive(Clone, Copy)]
enum AttributeType {
    Text,
    Integer,
    Double,
    Boolean,
}

impl AttributeType {
    /// Type name shared by GEXF and GraphML.
    fn xml_type(&self) -> &'static str {
        match self {
            AttributeType::Text => "string",
            AttributeType::Integer => "long",
            AttributeType::Double => "double",
            AttributeType::Boolean => "boolean",
        }
    }
}

const NODE_ATTRIBUTES: [(&str, AttributeType); 13] = [
    ("contig", AttributeType::Text),
    ("organism", AttributeType::Text),
    ("genes_count", AttributeType::Integer),
    ("families", AttributeType::Text),
    ("families_count", AttributeType::Integer),
    ("is_contig_border", AttributeType::Boolean),
    ("is_whole_contig", AttributeType::Boolean),
    ("spot_id", AttributeType::Text),
    ("min_grr_cluster", AttributeType::Text),
    ("max_grr_cluster", AttributeType::Text),
    ("jaccard_index_cluster", AttributeType::Text),
    ("identical", AttributeType::Boolean),
    ("name", AttributeType::Text),
];

const EDGE_ATTRIBUTES: [(&str, AttributeType); 4] = [
    ("min_grr", AttributeType::Double),
    ("max_grr", AttributeType::Double),
    ("jaccard_index", AttributeType::Double),
    ("identical", AttributeType::Boolean),
];

/// Values of the node attributes that are set, by position in
/// `NODE_ATTRIBUTES`.
fn node_values(attributes: &NodeAttributes) -> Vec<(usize, String)> {
    let mut values = vec![];
    let mut push = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            if let Some(position) = NODE_ATTRIBUTES.iter().position(|(name, _)| *name == key) {
                values.push((position, value));
            }
        }
    };
    push("contig", attributes.contig.clone());
    push("organism", attributes.organism.clone());
    push("genes_count", attributes.genes_count.map(|c| c.to_string()));
    push("families", attributes.families.clone());
    push(
        "families_count",
        attributes.families_count.map(|c| c.to_string()),
    );
    push(
        "is_contig_border",
        attributes.is_contig_border.map(|b| b.to_string()),
    );
    push(
        "is_whole_contig",
        attributes.is_whole_contig.map(|b| b.to_string()),
    );
    push("spot_id", attributes.spot_id.clone());
    for metric in Metric::ALL.iter() {
        push(
            metric.cluster_attribute(),
            attributes.clusters.get(metric).cloned(),
        );
    }
    push("identical", Some(attributes.identical.to_string()));
    push("name", attributes.name.clone());
    values
}

fn edge_values(metrics: &EdgeMetrics) -> [String; 4] {
    [
        metrics.min_grr.to_string(),
        metrics.max_grr.to_string(),
        metrics.jaccard_index.to_string(),
        metrics.identical.to_string(),
    ]
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn write_gexf(graph: &GrrGraph, path: &Path) -> Result<()> {
    debug!("Writing GEXF graph to {}", path.display());
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        out,
        "<gexf xmlns=\"http://www.gexf.net/1.2draft\" version=\"1.2\">"
    )?;
    writeln!(
        out,
        "  <graph defaultedgetype=\"undirected\" mode=\"static\">"
    )?;

    writeln!(out, "    <attributes class=\"node\" mode=\"static\">")?;
    for (i, (name, kind)) in NODE_ATTRIBUTES.iter().enumerate() {
        writeln!(
            out,
            "      <attribute id=\"{}\" title=\"{}\" type=\"{}\" />",
            i,
            name,
            kind.xml_type()
        )?;
    }
    writeln!(out, "    </attributes>")?;
    writeln!(out, "    <attributes class=\"edge\" mode=\"static\">")?;
    for (i, (name, kind)) in EDGE_ATTRIBUTES.iter().enumerate() {
        writeln!(
            out,
            "      <attribute id=\"{}\" title=\"{}\" type=\"{}\" />",
            i,
            name,
            kind.xml_type()
        )?;
    }
    writeln!(out, "    </attributes>")?;

    writeln!(out, "    <nodes>")?;
    for node in 0..graph.node_count() {
        writeln!(
            out,
            "      <node id=\"{}\" label=\"{}\">",
            node,
            escape(graph.name(node))
        )?;
        writeln!(out, "        <attvalues>")?;
        for (key, value) in node_values(graph.attributes(node)) {
            writeln!(
                out,
                "          <attvalue for=\"{}\" value=\"{}\" />",
                key,
                escape(&value)
            )?;
        }
        writeln!(out, "        </attvalues>")?;
        writeln!(out, "      </node>")?;
    }
    writeln!(out, "    </nodes>")?;

    writeln!(out, "    <edges>")?;
    for (i, ((a, b), metrics)) in graph.edges().enumerate() {
        writeln!(
            out,
            "      <edge id=\"{}\" source=\"{}\" target=\"{}\" weight=\"{}\">",
            i, a, b, metrics.min_grr
        )?;
        writeln!(out, "        <attvalues>")?;
        for (key, value) in edge_values(metrics).iter().enumerate() {
            writeln!(
                out,
                "          <attvalue for=\"{}\" value=\"{}\" />",
                key, value
            )?;
        }
        writeln!(out, "        </attvalues>")?;
        writeln!(out, "      </edge>")?;
    }
    writeln!(out, "    </edges>")?;
    writeln!(out, "  </graph>")?;
    writeln!(out, "</gexf>")?;
    out.flush()?;
    Ok(())
}

pub fn write_graphml(graph: &GrrGraph, path: &Path) -> Result<()> {
    debug!("Writing GraphML graph to {}", path.display());
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(
        out,
        "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:schemaLocation=\"http://graphml.graphdrawing.org/xmlns \
         http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd\">"
    )?;
    // node keys are n0.., edge keys e0..
    for (i, (name, kind)) in NODE_ATTRIBUTES.iter().enumerate() {
        writeln!(
            out,
            "  <key id=\"n{}\" for=\"node\" attr.name=\"{}\" attr.type=\"{}\" />",
            i,
            name,
            kind.xml_type()
        )?;
    }
    for (i, (name, kind)) in EDGE_ATTRIBUTES.iter().enumerate() {
        writeln!(
            out,
            "  <key id=\"e{}\" for=\"edge\" attr.name=\"{}\" attr.type=\"{}\" />",
            i,
            name,
            kind.xml_type()
        )?;
    }
    writeln!(out, "  <graph edgedefault=\"undirected\">")?;
    for node in 0..graph.node_count() {
        writeln!(out, "    <node id=\"{}\">", escape(graph.name(node)))?;
        for (key, value) in node_values(graph.attributes(node)) {
            writeln!(
                out,
                "      <data key=\"n{}\">{}</data>",
                key,
                escape(&value)
            )?;
        }
        writeln!(out, "    </node>")?;
    }
    for ((a, b), metrics) in graph.edges() {
        writeln!(
            out,
            "    <edge source=\"{}\" target=\"{}\">",
            escape(graph.name(*a)),
            escape(graph.name(*b))
        )?;
        for (key, value) in edge_values(metrics).iter().enumerate() {
            writeln!(out, "      <data key=\"e{}\">{}</data>", key, value)?;
        }
        writeln!(out, "    </edge>")?;
    }
    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")?;
    out.flush()?;
    Ok(())
}
