use crate::engine::FilterEngine;
use crate::events::{CatalogEvent, EventBus, EventSource, Outbox, SubscriptionId};
use crate::models::FilterOutcome;
use crate::surface::RenderingSurface;

/// 控制器上下文 - 事件处理器可以访问的全部状态
pub struct CatalogContext<S> {
    pub engine: FilterEngine,
    pub surface: S,
    /// 最近一次筛选的结果
    pub last_outcome: Option<FilterOutcome>,
}

impl<S: RenderingSurface> CatalogContext<S> {
    fn refilter(&mut self) {
        self.last_outcome = Some(self.engine.apply(&mut self.surface));
    }
}

/// 目录控制器 - 把页面事件接到筛选引擎上
///
/// 内置处理器在构造时注册一次，外部可以额外订阅任意来源。
pub struct CatalogController<S> {
    context: CatalogContext<S>,
    bus: EventBus<CatalogContext<S>>,
}

impl<S: RenderingSurface + 'static> CatalogController<S> {
    pub fn new(engine: FilterEngine, surface: S) -> Self {
        let mut bus = EventBus::new();
        register_default_handlers(&mut bus);

        Self {
            context: CatalogContext {
                engine,
                surface,
                last_outcome: None,
            },
            bus,
        }
    }

    /// 处理一个页面事件，返回处理后的最新筛选结果
    pub fn handle(&mut self, event: CatalogEvent) -> Option<&FilterOutcome> {
        log::debug!("处理事件: {:?}", event);
        self.bus.publish(&mut self.context, event);
        self.context.last_outcome.as_ref()
    }

    /// 不经过事件直接重新筛选
    pub fn refresh(&mut self) -> &FilterOutcome {
        let outcome = self.context.engine.apply(&mut self.context.surface);
        self.context.last_outcome.insert(outcome)
    }

    pub fn subscribe<F>(&mut self, source: EventSource, handler: F) -> SubscriptionId
    where
        F: FnMut(&CatalogEvent, &mut CatalogContext<S>, &mut Outbox) + 'static,
    {
        self.bus.subscribe(source, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn surface(&self) -> &S {
        &self.context.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.context.surface
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.context.engine
    }

    pub fn last_outcome(&self) -> Option<&FilterOutcome> {
        self.context.last_outcome.as_ref()
    }
}

fn register_default_handlers<S: RenderingSurface + 'static>(bus: &mut EventBus<CatalogContext<S>>) {
    bus.subscribe(EventSource::SearchInput, |event, ctx, _| {
        if let CatalogEvent::SearchChanged { query } = event {
            ctx.surface.set_search_query(query);
        }
        ctx.refilter();
    });

    bus.subscribe(EventSource::PriceSlider, |event, ctx, _| {
        if let CatalogEvent::PriceChanged { value } = event {
            ctx.surface.set_price_value(*value);
        }
        ctx.refilter();
    });

    bus.subscribe(EventSource::PriceReset, |_, ctx, _| {
        if let Some(slider) = ctx.surface.price_slider() {
            ctx.surface.set_price_value(slider.max());
        }
        ctx.refilter();
    });

    bus.subscribe(EventSource::FilterToggle, |event, ctx, _| {
        if let CatalogEvent::FilterToggled { index, checked } = event {
            ctx.surface.set_filter_checked(*index, *checked);
        }
        ctx.refilter();
    });

    bus.subscribe(EventSource::ClearFilters, |_, ctx, _| {
        ctx.last_outcome = Some(ctx.engine.clear(&mut ctx.surface));
    });

    bus.subscribe(EventSource::ViewChange, |_, ctx, _| ctx.refilter());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmptyStateChange;
    use crate::slider::PriceSlider;
    use crate::surface::MemorySurface;
    use catalog_common::ProductEntry;

    fn controller() -> CatalogController<MemorySurface> {
        let surface = MemorySurface::new()
            .with_entry(
                ProductEntry::new("a", "Acoustic panel", 30.0)
                    .with_characteristic("type", "acoustic")
                    .in_view("all-products"),
            )
            .with_entry(
                ProductEntry::new("b", "Stretch ceiling", 80.0)
                    .with_characteristic("type", "stretch")
                    .in_view("all-products"),
            )
            .with_entry(ProductEntry::new("c", "Spot light", 15.0).in_view("lighting"))
            .with_slider(PriceSlider::new(0.0, 100.0, 100.0))
            .with_control("type", "all", true)
            .with_control("type", "acoustic", false)
            .with_active_view("all-products");
        CatalogController::new(FilterEngine::default(), surface)
    }

    #[test]
    fn search_event_refilters() {
        let mut controller = controller();
        let outcome = controller
            .handle(CatalogEvent::SearchChanged { query: "stretch".into() })
            .cloned()
            .unwrap();

        assert_eq!(outcome.visibility, vec![false, true, false]);
        assert_eq!(controller.surface().search_query(), "stretch");
    }

    #[test]
    fn slider_and_reset_events() {
        let mut controller = controller();
        let outcome = controller.handle(CatalogEvent::PriceChanged { value: 20.0 }).unwrap();
        assert_eq!(outcome.visibility, vec![false, false, true]);
        assert_eq!(outcome.empty_state, EmptyStateChange::Shown);

        let outcome = controller.handle(CatalogEvent::PriceReset).unwrap();
        assert_eq!(outcome.visible, 3);
        assert_eq!(outcome.empty_state, EmptyStateChange::Removed);
        assert!(controller.surface().price_slider().unwrap().is_reset());
    }

    #[test]
    fn toggle_then_clear() {
        let mut controller = controller();
        controller.handle(CatalogEvent::FilterToggled { index: 1, checked: true });
        assert_eq!(controller.surface().visible_ids(), vec!["a"]);

        let outcome = controller.handle(CatalogEvent::FiltersCleared).unwrap();
        assert_eq!(outcome.visible, 3);
        assert!(!controller.surface().controls()[1].checked);
        assert!(controller.surface().controls()[0].checked);
    }

    #[test]
    fn view_change_updates_empty_state_for_new_view() {
        let mut controller = controller();
        controller.handle(CatalogEvent::SearchChanged { query: "panel".into() });
        assert!(controller.surface().empty_state("lighting").is_none());

        controller.surface_mut().set_active_view(Some("lighting"));
        let outcome = controller.handle(CatalogEvent::ViewChanged).unwrap();
        assert_eq!(outcome.empty_state, EmptyStateChange::Shown);
        assert!(controller.surface().empty_state("lighting").is_some());
    }

    #[test]
    fn extra_subscribers_observe_after_default_handler() {
        let mut controller = controller();
        let seen = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let observed = seen.clone();
        controller.subscribe(EventSource::PriceSlider, move |_, ctx, _| {
            observed.set(ctx.last_outcome.as_ref().map(|o| o.visible).unwrap_or(0));
        });

        controller.handle(CatalogEvent::PriceChanged { value: 40.0 });
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn refresh_without_event() {
        let mut controller = controller();
        controller.surface_mut().set_search_query("light");
        assert_eq!(controller.refresh().visible, 1);
        assert_eq!(controller.last_outcome().unwrap().visible, 1);
    }
}
