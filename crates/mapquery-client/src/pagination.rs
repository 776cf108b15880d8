//! Page navigation over stored query results

use mapquery_core::models::{LayerId, LayerQueryResult, PaginationDescriptor};
use mapquery_core::ports::{FeaturePage, FeaturePageRequest, PagedSpatialQueryRequest};

pub use mapquery_core::models::{page_numbers, PageItem};

/// Request needed to show another page of a layer
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    /// Re-run the spatial query for one page
    Spatial(PagedSpatialQueryRequest),

    /// Plain feature listing for the layer
    Plain(FeaturePageRequest),
}

/// Decides how a page change is fetched and folds the answer back into the
/// layer's stored result
#[derive(Debug, Clone, Copy)]
pub struct PaginationController {
    page_size: u32,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self { page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Descriptor for a layer result, synthesised from its count when the
    /// backend sent none
    pub fn descriptor_for(&self, entry: Option<&LayerQueryResult>) -> PaginationDescriptor {
        match entry {
            Some(entry) => entry
                .pagination
                .unwrap_or_else(|| PaginationDescriptor::new(1, self.page_size, entry.count)),
            None => PaginationDescriptor::empty(self.page_size),
        }
    }

    /// Plan the fetch for `page` of `layer`; `None` when the page is out of range.
    ///
    /// Results larger than one page are re-queried spatially while the query
    /// WKT is known, against the same `query_layers` the polygon was first
    /// sent with; everything else falls back to the plain listing.
    pub fn plan(
        &self,
        layer: &LayerId,
        entry: Option<&LayerQueryResult>,
        query_wkt: Option<&str>,
        query_layers: &[LayerId],
        page: u32,
    ) -> Option<PageFetch> {
        let current = self.descriptor_for(entry);
        if !current.contains_page(page) {
            return None;
        }

        let fetch = match query_wkt {
            Some(wkt) if current.needs_server_paging() => {
                let mut layers = query_layers.to_vec();
                if !layers.contains(layer) {
                    layers.push(layer.clone());
                }
                PageFetch::Spatial(PagedSpatialQueryRequest {
                    geometry: wkt.to_string(),
                    layers,
                    page,
                    page_size: current.page_size,
                })
            }
            _ => PageFetch::Plain(FeaturePageRequest {
                layer: layer.clone(),
                page,
                page_size: current.page_size,
                get_total_count: page == 1 || entry.and_then(|e| e.pagination).is_none(),
            }),
        };
        Some(fetch)
    }

    /// Pick `layer`'s entry out of a paginated spatial response
    pub fn merge_spatial(
        &self,
        layer: &LayerId,
        page: u32,
        results: Vec<LayerQueryResult>,
    ) -> Option<LayerQueryResult> {
        let mut result = results.into_iter().find(|r| &r.layer_id == layer)?;
        if result.pagination.is_none() {
            result.pagination = Some(PaginationDescriptor::new(page, self.page_size, result.count));
        }
        Some(result)
    }

    /// Replace the features of `previous` with a plain page.
    ///
    /// Without pagination in the response the previous descriptor is kept,
    /// moved to `page`.
    pub fn merge_plain(
        &self,
        layer: &LayerId,
        layer_name: &str,
        previous: Option<&LayerQueryResult>,
        page: u32,
        response: FeaturePage,
    ) -> LayerQueryResult {
        let pagination = response
            .pagination
            .unwrap_or_else(|| self.descriptor_for(previous).at_page(page));
        let count = previous.map(|p| p.count).unwrap_or(pagination.total_features);

        LayerQueryResult::success(layer.clone(), layer_name, response.features, count)
            .with_pagination(pagination)
    }
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(mapquery_core::models::DEFAULT_PAGE_SIZE)
    }
}
