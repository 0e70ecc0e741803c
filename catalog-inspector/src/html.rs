use std::rc::Rc;

use catalog_common::{parse_price, Characteristic, FilterControl, ProductEntry};
use catalog_filter::{MemorySurface, PriceSlider, RenderingSurface, Selectors};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::InspectError;

// 解析 HTML 文档
pub fn parse_html(html: &str) -> Result<RcDom, InspectError> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| InspectError::Parse(e.to_string()))
}

// 简单选择器：只支持 ".a.b" 形式的类选择器
fn class_list(selector: &str) -> Vec<&str> {
    selector.split('.').map(str::trim).filter(|c| !c.is_empty()).collect()
}

fn attr(handle: &Handle, name: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn tag_name(handle: &Handle) -> Option<String> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn has_classes(handle: &Handle, classes: &[&str]) -> bool {
    if classes.is_empty() {
        return false;
    }
    let Some(value) = attr(handle, "class") else {
        return false;
    };
    let own: Vec<&str> = value.split_whitespace().collect();
    classes.iter().all(|c| own.contains(c))
}

// 提取节点下的全部文本
fn text_of(handle: &Handle) -> String {
    let mut text = String::new();
    collect_text(handle, &mut text);
    text.trim().to_string()
}

fn collect_text(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => text.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, text);
            }
        }
    }
}

fn find_descendant(handle: &Handle, classes: &[&str]) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if has_classes(child, classes) {
            return Some(Rc::clone(child));
        }
        if let Some(found) = find_descendant(child, classes) {
            return Some(found);
        }
    }
    None
}

fn collect_with_attr(handle: &Handle, name: &str, found: &mut Vec<Handle>) {
    for child in handle.children.borrow().iter() {
        if attr(child, name).is_some() {
            found.push(Rc::clone(child));
        }
        collect_with_attr(child, name, found);
    }
}

// 遍历过程中的页面状态
#[derive(Default)]
struct WalkState {
    active_view: Option<String>,
    panes: usize,
}

/// 页面解析器 - 把服务端渲染的目录页面读入内存渲染面
pub struct PageParser<'a> {
    selectors: &'a Selectors,
    item: Vec<&'a str>,
    name: Vec<&'a str>,
    description: Vec<&'a str>,
    price: Vec<&'a str>,
    pane: Vec<&'a str>,
    active_pane: Vec<&'a str>,
}

impl<'a> PageParser<'a> {
    pub fn new(selectors: &'a Selectors) -> Self {
        Self {
            selectors,
            item: class_list(&selectors.product_item),
            name: class_list(&selectors.product_name),
            description: class_list(&selectors.product_description),
            price: class_list(&selectors.product_price),
            pane: class_list(&selectors.view_pane),
            active_pane: class_list(&selectors.active_view),
        }
    }

    pub fn parse(&self, html: &str) -> Result<MemorySurface, InspectError> {
        let dom = parse_html(html)?;
        let mut surface = MemorySurface::new();
        let mut state = WalkState::default();
        self.walk(&dom.document, None, &mut surface, &mut state);
        surface.set_active_view(state.active_view.as_deref());
        Ok(surface)
    }

    fn walk(
        &self,
        handle: &Handle,
        pane: Option<&str>,
        surface: &mut MemorySurface,
        state: &mut WalkState,
    ) {
        let mut current_pane = pane.map(str::to_string);

        if let NodeData::Element { .. } = handle.data {
            if has_classes(handle, &self.pane) {
                let active = has_classes(handle, &self.active_pane);
                let key = self
                    .selectors
                    .pane_key(attr(handle, "id").as_deref(), active, state.panes);
                state.panes += 1;
                if active && state.active_view.is_none() {
                    state.active_view = Some(key.clone());
                }
                current_pane = Some(key);
            }

            if has_classes(handle, &self.item) {
                let index = surface.entries().len();
                let mut entry = self.read_entry(index, handle);
                entry.view = current_pane.clone();
                surface.push_entry(entry);
                return;
            }

            if tag_name(handle).as_deref() == Some("input") {
                self.read_input(handle, surface);
            }
        }

        for child in handle.children.borrow().iter() {
            self.walk(child, current_pane.as_deref(), surface, state);
        }
    }

    fn read_input(&self, handle: &Handle, surface: &mut MemorySurface) {
        let id = attr(handle, "id").unwrap_or_default();
        let value = attr(handle, "value").unwrap_or_default();

        if id == self.selectors.search_input_id {
            surface.set_search_query(&value);
        } else if id == self.selectors.price_slider_id {
            let min = attr(handle, "min").unwrap_or_default();
            let max = attr(handle, "max").unwrap_or_default();
            surface.set_slider(Some(PriceSlider::from_raw(&min, &max, &value)));
        } else if attr(handle, "type").as_deref() == Some("checkbox") {
            if let Some(category) = attr(handle, "data-filter") {
                let checked = attr(handle, "checked").is_some();
                surface.push_control(FilterControl::new(category, value, checked));
            }
        }
    }

    fn read_entry(&self, index: usize, item: &Handle) -> ProductEntry {
        let child_text = |classes: &[&str]| find_descendant(item, classes).map(|h| text_of(&h));

        let mut tagged = Vec::new();
        collect_with_attr(item, &self.selectors.characteristic_attr, &mut tagged);
        let characteristics = tagged
            .iter()
            .filter_map(|h| {
                let category = attr(h, &self.selectors.characteristic_attr)?;
                Some(Characteristic::new(category, text_of(h)))
            })
            .collect();

        ProductEntry {
            id: attr(item, "data-product-id").unwrap_or_else(|| index.to_string()),
            name: child_text(&self.name).unwrap_or_default(),
            description: child_text(&self.description).unwrap_or_default(),
            price: child_text(&self.price).map(|t| parse_price(&t)).unwrap_or(0.0),
            characteristics,
            view: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <input type="text" id="productSearch" value="">
  <input type="range" id="priceSlider" min="10" max="500" value="500">
  <input type="checkbox" data-filter="type" value="all" checked>
  <input type="checkbox" data-filter="type" value="acoustic">
  <div class="tab-content">
    <div class="tab-pane fade show active" id="all-products">
      <div class="product-item" data-product-id="p1">
        <h5 class="product-name">Acoustic <b>panel</b></h5>
        <p class="product-description">Sound absorbing</p>
        <span class="product-price">от 35 сом/м²</span>
        <span data-characteristic="type">acoustic</span>
      </div>
      <div class="product-item">
        <h5 class="product-name">Stretch ceiling</h5>
        <span class="product-price">$120.00</span>
      </div>
    </div>
    <div class="tab-pane fade" id="lighting">
      <div class="product-item"><h5 class="product-name">Spot</h5></div>
    </div>
  </div>
</body></html>"#;

    #[test]
    fn reads_entries_controls_and_slider() {
        let selectors = Selectors::default();
        let surface = PageParser::new(&selectors).parse(PAGE).unwrap();

        let entries = surface.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, "p1");
        assert_eq!(entries[0].name, "Acoustic panel");
        assert_eq!(entries[0].price, 35.0);
        assert_eq!(entries[0].values_for("type").collect::<Vec<_>>(), vec!["acoustic"]);
        assert_eq!(entries[0].view.as_deref(), Some("all-products"));
        assert_eq!(entries[1].id, "1");
        assert_eq!(entries[1].price, 120.0);
        assert_eq!(entries[2].view.as_deref(), Some("lighting"));
        assert_eq!(entries[2].price, 0.0);

        let controls = surface.controls();
        assert_eq!(controls.len(), 2);
        assert!(controls[0].checked);
        assert!(!controls[1].checked);

        let slider = surface.price_slider().unwrap();
        assert_eq!(slider.min(), 10.0);
        assert_eq!(slider.max(), 500.0);
        assert_eq!(surface.active_view().as_deref(), Some("all-products"));
    }

    #[test]
    fn panes_without_id_still_own_their_entries() {
        let page = r#"<div class="tab-content">
  <div class="tab-pane active">
    <div class="product-item"><h5 class="product-name">Panel</h5></div>
  </div>
  <div class="tab-pane">
    <div class="tab-pane inner">
      <div class="product-item"><h5 class="product-name">Spot</h5></div>
    </div>
  </div>
</div>"#;
        let selectors = Selectors::default();
        let surface = PageParser::new(&selectors).parse(page).unwrap();
        let entries = surface.entries();

        assert_eq!(surface.active_view().as_deref(), Some(".tab-pane.active"));
        assert_eq!(entries[0].view.as_deref(), Some(".tab-pane.active"));
        assert!(entries[0].belongs_to(".tab-pane.active"));
        assert_eq!(entries[1].view.as_deref(), Some(".tab-pane:2"));
    }

    #[test]
    fn page_without_catalog_is_empty() {
        let selectors = Selectors::default();
        let surface = PageParser::new(&selectors).parse("<p>nothing here</p>").unwrap();
        assert!(surface.entries().is_empty());
        assert!(surface.price_slider().is_none());
        assert!(surface.active_view().is_none());
    }
}
