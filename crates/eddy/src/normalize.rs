//! Re-fitting an existing layout to new size options.
//!
//! Cycle classification, link types and columns depend only on the graph, so a size or spacing
//! change only re-derives the scale, margins and everything downstream of them.

use crate::SankeyLayout;
use crate::breadth::{
    LayoutState, assign_x_bands, circle_margins, compute_scale, fill_height, resolve_padding,
    resolve_residual_collisions, scale_extent, set_link_widths,
};
use crate::links::{compute_link_paths, sort_source_links, sort_target_links};
use crate::options::{LayoutOptions, SCALE_DAMPING};

impl SankeyLayout {
    /// Re-fits the layout to `options` without re-running cycle detection or column assignment.
    ///
    /// Padding, scale, margins and node heights are derived afresh for the new extent, exactly as
    /// a full layout would. Node tops keep their relative position inside the node area, so the
    /// stacking found by the full pipeline is kept. Options that only affect the earlier stages
    /// (`iterations`, `align`, `sort_nodes`) have no effect here.
    pub fn update(&mut self, options: &LayoutOptions) {
        let old = self.state;
        let outer = options.extent;
        let graph = &mut self.graph;
        let columns = graph.columns();
        let padding = resolve_padding(&columns, options.node_padding, outer.height());

        let ky = compute_scale(graph, &columns, outer.height(), padding) * SCALE_DAMPING;
        set_link_widths(graph, ky);
        let margins = circle_margins(graph);
        let (inner, scale_y) = scale_extent(outer, &margins);
        let ky = ky * scale_y;
        set_link_widths(graph, ky);
        assign_x_bands(graph, &inner, options.node_width);

        let old_height = old.inner.height();
        for column in &columns {
            let n = column.len();
            let total: f64 = column.iter().map(|&ni| graph.nodes[ni].value).sum();
            let even_share = (!(total > 0.0)).then(|| {
                let available = inner.height() - (n as f64 - 1.0) * padding;
                available.max(0.0) / n as f64 * SCALE_DAMPING
            });
            for &ni in column {
                let node = &mut graph.nodes[ni];
                let h = even_share.unwrap_or(node.value * ky);
                let t = if old_height > 0.0 {
                    (node.y0 - old.inner.y0) / old_height
                } else {
                    0.0
                };
                node.y0 = inner.y0 + t * inner.height();
                node.y1 = node.y0 + h;
            }
        }

        self.state = LayoutState {
            outer,
            inner,
            padding,
            ky,
            margins,
        };
        tracing::debug!(ky, padding, ?margins, "re-fitted layout to new extent");

        resolve_residual_collisions(graph, &self.state);
        fill_height(graph, &mut self.state);
        sort_source_links(graph);
        sort_target_links(graph);
        compute_link_paths(graph, &self.state, options.circular_link_gap);
        graph.debug_assert_finite("update");
    }
}
