//! Generic tab container.
//!
//! Tabs are keyed by an id, kept in insertion order, and displayed through a
//! swappable [`OrderPolicy`]. Closing the selected tab moves the selection to
//! its display-order predecessor, or to the second tab when the first one is
//! closed.

use std::cmp::Ordering;

use zipcast_core::TabOrder;

/// Display ordering of tab ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Order in which tabs were created
    #[default]
    Insertion,
    Ascending,
    Descending,
}

impl OrderPolicy {
    pub fn compare<Id: Ord>(&self, a: &Id, b: &Id) -> Ordering {
        match self {
            Self::Insertion => Ordering::Equal,
            Self::Ascending => a.cmp(b),
            Self::Descending => b.cmp(a),
        }
    }
}

impl From<TabOrder> for OrderPolicy {
    fn from(order: TabOrder) -> Self {
        match order {
            TabOrder::Default => Self::Insertion,
            TabOrder::Asc => Self::Ascending,
            TabOrder::Desc => Self::Descending,
        }
    }
}

/// A pane bound to a data source and the templates that render it
#[derive(Debug, Clone, PartialEq)]
pub struct Tab<Id, D> {
    pub id: Id,
    pub data: D,
    pub header_template: &'static str,
    pub body_template: &'static str,
}

/// Called with the id of every tab that gets removed
pub type RemovalListener<Id> = Box<dyn Fn(&Id) + Send + Sync>;

pub struct TabContainer<Id, D> {
    tabs: Vec<Tab<Id, D>>,
    selected: Option<Id>,
    order: OrderPolicy,
    on_removed: Option<RemovalListener<Id>>,
}

impl<Id, D> TabContainer<Id, D>
where
    Id: Ord + Clone,
{
    pub fn new(order: OrderPolicy) -> Self {
        Self {
            tabs: Vec::new(),
            selected: None,
            order,
            on_removed: None,
        }
    }

    pub fn with_removal_listener(mut self, listener: impl Fn(&Id) + Send + Sync + 'static) -> Self {
        self.on_removed = Some(Box::new(listener));
        self
    }

    /// Add a tab and select it.
    ///
    /// For an id that is already open the stored tab takes the new data
    /// source and templates, and the selection stays where it is.
    /// Returns true when a new tab was inserted.
    pub fn create_tab(&mut self, tab: Tab<Id, D>) -> bool {
        if let Some(existing) = self.tabs.iter_mut().find(|t| t.id == tab.id) {
            *existing = tab;
            return false;
        }

        self.selected = Some(tab.id.clone());
        self.tabs.push(tab);
        true
    }

    /// Select an open tab. Unknown ids leave the selection alone.
    pub fn select_tab(&mut self, id: &Id) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    /// Close a tab and notify the removal listener. Unknown ids are ignored.
    pub fn remove_tab(&mut self, id: &Id) -> bool {
        let Some(position) = self.tabs.iter().position(|t| &t.id == id) else {
            return false;
        };

        if self.selected.as_ref() == Some(id) {
            let ordered = self.ordered_ids();
            self.selected = if self.tabs.len() > 1 {
                let current = ordered.iter().position(|candidate| candidate == id).unwrap_or(0);
                let next = if current > 0 { current - 1 } else { 1 };
                ordered.get(next).cloned()
            } else {
                None
            };
        }

        self.tabs.remove(position);

        if let Some(listener) = &self.on_removed {
            listener(id);
        }
        true
    }

    /// Swap the display ordering. Stored insertion order is untouched, so
    /// switching back to [`OrderPolicy::Insertion`] restores it.
    pub fn set_order_policy(&mut self, order: OrderPolicy) {
        self.order = order;
    }

    pub fn order_policy(&self) -> OrderPolicy {
        self.order
    }

    pub fn selected_id(&self) -> Option<&Id> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Tab<Id, D>> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &Id) -> Option<&Tab<Id, D>> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &Id) -> Option<&mut Tab<Id, D>> {
        self.tabs.iter_mut().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.tabs.iter().any(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Tab ids in display order. Ties keep insertion order.
    pub fn ordered_ids(&self) -> Vec<Id> {
        self.ordered_tabs().into_iter().map(|t| t.id.clone()).collect()
    }

    /// Tabs in display order
    pub fn ordered_tabs(&self) -> Vec<&Tab<Id, D>> {
        let mut tabs: Vec<&Tab<Id, D>> = self.tabs.iter().collect();
        tabs.sort_by(|a, b| self.order.compare(&a.id, &b.id));
        tabs
    }
}

impl<Id, D> Default for TabContainer<Id, D>
where
    Id: Ord + Clone,
{
    fn default() -> Self {
        Self::new(OrderPolicy::default())
    }
}
