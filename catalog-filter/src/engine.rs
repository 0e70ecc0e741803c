use catalog_common::ProductEntry;

use crate::builder::FilterStateBuilder;
use crate::models::{EmptyStateChange, FilterConfig, FilterOutcome, FilterState, MissingCharacteristic};
use crate::surface::RenderingSurface;

/// 商品筛选引擎
///
/// 无内部状态：每次调用都从渲染面重新读取输入并全量重算可见性。
#[derive(Clone, Debug, Default)]
pub struct FilterEngine {
    config: FilterConfig,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// 从渲染面读取当前筛选状态
    pub fn read_state<S: RenderingSurface + ?Sized>(&self, surface: &S) -> FilterState {
        let slider = surface.price_slider();
        let controls = surface.filter_controls();

        FilterStateBuilder::new(&self.config.all_sentinel)
            .search(&surface.search_query())
            .slider(slider.as_ref())
            .controls(&controls)
            .build()
    }

    /// 判断单个条目是否可见，按 价格 -> 搜索 -> 类别 的顺序求值
    pub fn matches(&self, state: &FilterState, entry: &ProductEntry) -> bool {
        passes_price(state, entry)
            && passes_search(state, entry)
            && passes_categories(state, entry, self.config.missing_characteristic)
    }

    /// 计算所有条目的可见性
    pub fn evaluate(&self, state: &FilterState, entries: &[ProductEntry]) -> Vec<bool> {
        entries.iter().map(|entry| self.matches(state, entry)).collect()
    }

    /// 读取输入、写回每个条目的可见性，并更新当前视图的空结果提示
    pub fn apply<S: RenderingSurface + ?Sized>(&self, surface: &mut S) -> FilterOutcome {
        let state = self.read_state(surface);
        let entries = surface.entries();
        let visibility = self.evaluate(&state, &entries);

        for (index, visible) in visibility.iter().enumerate() {
            surface.set_entry_visible(index, *visible);
        }

        let visible = visibility.iter().filter(|v| **v).count();
        let active_view = surface.active_view();
        let active_view_visible = match active_view.as_deref() {
            Some(view) => entries
                .iter()
                .zip(&visibility)
                .filter(|(entry, visible)| **visible && entry.belongs_to(view))
                .count(),
            None => 0,
        };

        let empty_state = match active_view.as_deref() {
            Some(view) => self.sync_empty_state(surface, view, active_view_visible),
            None => EmptyStateChange::Unchanged,
        };

        log::debug!(
            "筛选完成: 可见 {}/{}，当前视图 {:?} 可见 {}，空结果提示 {:?}",
            visible,
            entries.len(),
            active_view,
            active_view_visible,
            empty_state
        );

        FilterOutcome {
            hidden: entries.len() - visible,
            visibility,
            visible,
            active_view,
            active_view_visible,
            empty_state,
        }
    }

    /// 清空所有筛选条件后重新筛选
    ///
    /// 清空搜索词、滑块回到上限、勾选哨兵控件并取消其余控件。
    pub fn clear<S: RenderingSurface + ?Sized>(&self, surface: &mut S) -> FilterOutcome {
        surface.set_search_query("");

        if let Some(slider) = surface.price_slider() {
            surface.set_price_value(slider.max());
        }

        for (index, control) in surface.filter_controls().iter().enumerate() {
            surface.set_filter_checked(index, control.is_sentinel(&self.config.all_sentinel));
        }

        self.apply(surface)
    }

    fn sync_empty_state<S: RenderingSurface + ?Sized>(
        &self,
        surface: &mut S,
        view: &str,
        visible_in_view: usize,
    ) -> EmptyStateChange {
        let present = surface.has_empty_state(view);

        if visible_in_view == 0 && !present {
            surface.show_empty_state(view, &self.config.empty_state);
            EmptyStateChange::Shown
        } else if visible_in_view > 0 && present {
            surface.remove_empty_state(view);
            EmptyStateChange::Removed
        } else {
            EmptyStateChange::Unchanged
        }
    }
}

fn passes_price(state: &FilterState, entry: &ProductEntry) -> bool {
    entry.price >= state.price_min && entry.price <= state.price_max
}

fn passes_search(state: &FilterState, entry: &ProductEntry) -> bool {
    state.search_term.is_empty() || entry.searchable_text().contains(&state.search_term)
}

fn passes_categories(
    state: &FilterState,
    entry: &ProductEntry,
    policy: MissingCharacteristic,
) -> bool {
    state.category_filters.iter().all(|(category, accepted)| {
        let mut values = entry.values_for(category).peekable();
        if values.peek().is_none() {
            return policy == MissingCharacteristic::Lenient;
        }
        values.any(|value| accepted.contains(value))
    })
}
