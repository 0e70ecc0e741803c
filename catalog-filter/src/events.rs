use std::collections::VecDeque;

/// 事件来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventSource {
    SearchInput,
    PriceSlider,
    PriceReset,
    FilterToggle,
    ClearFilters,
    ViewChange,
}

/// 目录页面事件
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogEvent {
    /// 搜索框内容变化
    SearchChanged { query: String },
    /// 价格滑块拖动
    PriceChanged { value: f64 },
    /// 价格范围重置按钮
    PriceReset,
    /// 类别复选框切换，`index` 为控件序号
    FilterToggled { index: usize, checked: bool },
    /// 清空全部筛选
    FiltersCleared,
    /// 切换了标签页
    ViewChanged,
}

impl CatalogEvent {
    pub fn source(&self) -> EventSource {
        match self {
            CatalogEvent::SearchChanged { .. } => EventSource::SearchInput,
            CatalogEvent::PriceChanged { .. } => EventSource::PriceSlider,
            CatalogEvent::PriceReset => EventSource::PriceReset,
            CatalogEvent::FilterToggled { .. } => EventSource::FilterToggle,
            CatalogEvent::FiltersCleared => EventSource::ClearFilters,
            CatalogEvent::ViewChanged => EventSource::ViewChange,
        }
    }
}

/// 订阅标识，用于取消订阅
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// 处理器在执行期间发出的后续事件
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<CatalogEvent>,
}

impl Outbox {
    pub fn emit(&mut self, event: CatalogEvent) {
        self.events.push(event);
    }
}

pub type Handler<C> = Box<dyn FnMut(&CatalogEvent, &mut C, &mut Outbox)>;

struct Subscription<C> {
    id: SubscriptionId,
    source: EventSource,
    handler: Handler<C>,
}

/// 事件总线
///
/// 同步按序投递：同一来源的处理器按订阅顺序执行；处理器发出的事件排在队尾，
/// 当前事件的所有处理器执行完毕后才会投递。
pub struct EventBus<C> {
    next_id: u64,
    subscriptions: Vec<Subscription<C>>,
    queue: VecDeque<CatalogEvent>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscriptions: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// 订阅某个来源的事件
    pub fn subscribe<F>(&mut self, source: EventSource, handler: F) -> SubscriptionId
    where
        F: FnMut(&CatalogEvent, &mut C, &mut Outbox) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            source,
            handler: Box::new(handler),
        });
        id
    }

    /// 取消订阅，返回订阅是否存在
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self, source: EventSource) -> usize {
        self.subscriptions.iter().filter(|s| s.source == source).count()
    }

    /// 发布事件并投递到所有订阅者，返回投递次数
    pub fn publish(&mut self, context: &mut C, event: CatalogEvent) -> usize {
        self.queue.push_back(event);
        let mut delivered = 0;

        while let Some(event) = self.queue.pop_front() {
            let source = event.source();
            let mut outbox = Outbox::default();

            for subscription in self.subscriptions.iter_mut().filter(|s| s.source == source) {
                (subscription.handler)(&event, context, &mut outbox);
                delivered += 1;
            }

            self.queue.extend(outbox.events);
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_only_to_matching_source_in_order() {
        let mut bus: EventBus<Vec<String>> = EventBus::new();
        bus.subscribe(EventSource::SearchInput, |event, log, _| {
            if let CatalogEvent::SearchChanged { query } = event {
                log.push(format!("first:{}", query));
            }
        });
        bus.subscribe(EventSource::PriceSlider, |_, log, _| log.push("price".to_string()));
        bus.subscribe(EventSource::SearchInput, |_, log, _| log.push("second".to_string()));

        let mut log = Vec::new();
        let delivered = bus.publish(&mut log, CatalogEvent::SearchChanged { query: "lux".into() });

        assert_eq!(delivered, 2);
        assert_eq!(log, vec!["first:lux", "second"]);
    }

    #[test]
    fn emitted_events_run_after_current_event() {
        let mut bus: EventBus<Vec<&'static str>> = EventBus::new();
        bus.subscribe(EventSource::ClearFilters, |_, log, outbox| {
            log.push("clear-a");
            outbox.emit(CatalogEvent::PriceReset);
        });
        bus.subscribe(EventSource::ClearFilters, |_, log, _| log.push("clear-b"));
        bus.subscribe(EventSource::PriceReset, |_, log, _| log.push("reset"));

        let mut log = Vec::new();
        assert_eq!(bus.publish(&mut log, CatalogEvent::FiltersCleared), 3);
        assert_eq!(log, vec!["clear-a", "clear-b", "reset"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus: EventBus<u32> = EventBus::new();
        let id = bus.subscribe(EventSource::ViewChange, |_, count, _| *count += 1);
        let mut count = 0;

        bus.publish(&mut count, CatalogEvent::ViewChanged);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&mut count, CatalogEvent::ViewChanged);

        assert_eq!(count, 1);
        assert_eq!(bus.subscriber_count(EventSource::ViewChange), 0);
    }
}
