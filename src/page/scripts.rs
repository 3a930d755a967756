//! JavaScript evaluated in the game tab.
//!
//! Every script is a function body run as `(function(args) { ... })(ARGS)`
//! after [`PRELUDE`], so parameters travel as JSON and never need escaping.

use serde_json::Value;

/// Id of the injected status control.
pub const CONTROL_ID: &str = "autobuyer-toggle";

/// Page-side counter bumped by every click on the status control.
pub const CLICK_COUNTER: &str = "__autobuyerClicks";

pub const PRELUDE: &str = r#"
const ROW_SELECTOR = 'tr[ng-repeat*="unit"]';
const TAB_SELECTOR = '.nav-tabs a, .tab a';
const BUY_SELECTOR = 'a[ng-click*="buyMaxUnit"], a[ng-click*="buyMax"], button[ng-click*="buyMaxUnit"]';
const rowLabel = (row) => {
  const label = row.querySelector('.label-label, .titlecase, .unselectedlist-label');
  if (label) return label.textContent.trim();
  const cells = row.querySelectorAll('td');
  return cells.length > 1 ? cells[1].textContent.trim() : '';
};
const rowOwned = (row) => {
  const count = row.querySelector('.unit-count, [ng-bind*="count"], .count');
  if (count) return count.textContent.trim();
  const cells = row.querySelectorAll('td');
  return cells.length > 2 ? cells[2].textContent.trim() : '';
};
const unitRows = () => Array.from(document.querySelectorAll(ROW_SELECTOR));
const findRow = (name) => unitRows().find((row) => rowLabel(row) === name) || null;
const buyControl = (row) => (row ? row.querySelector(BUY_SELECTOR) : null);
const isDisabled = (el) =>
  el.disabled === true ||
  el.classList.contains('disabled') ||
  (!!el.parentElement && el.parentElement.classList.contains('disabled'));
const findTab = (name) => {
  const lower = name.toLowerCase();
  for (const tab of document.querySelectorAll(TAB_SELECTOR)) {
    if (tab.textContent.toLowerCase().trim().includes(lower)) return tab;
    if (tab.querySelector(`.icon-${lower}, .tab-icon-${lower}`)) return tab;
  }
  return null;
};
const overflowMenu = () =>
  Array.from(document.querySelectorAll('.dropdown-toggle'))
    .find((el) => !el.closest(ROW_SELECTOR) && el.textContent.includes('More')) || null;
const ensureControl = () => {
  let button = document.getElementById('autobuyer-toggle');
  if (!button) {
    button = document.createElement('button');
    button.id = 'autobuyer-toggle';
    button.style.cssText = 'position:fixed;top:10px;right:10px;z-index:9999;padding:10px;' +
      'color:white;background:#ff4444;border:none;border-radius:5px;cursor:pointer;' +
      'font-weight:bold;box-shadow:0 2px 5px rgba(0,0,0,0.3);';
    window.__autobuyerClicks = window.__autobuyerClicks || 0;
    button.addEventListener('click', (event) => {
      event.stopPropagation();
      window.__autobuyerClicks += 1;
    });
    document.body.appendChild(button);
  }
  return button;
};
"#;

pub const FRAMEWORK_READY: &str = r#"
return !!(window.angular && document.querySelector('[ng-app]'));
"#;

pub const GAME_READY: &str = r#"
return document.querySelectorAll(TAB_SELECTOR).length > 0 && unitRows().length > 0;
"#;

pub const TAB_PRESENT: &str = r#"
return findTab(args.tab) !== null;
"#;

pub const TAB_ACTIVATE: &str = r#"
const tab = findTab(args.tab);
if (!tab) return false;
tab.click();
return true;
"#;

pub const LIST_ITEMS: &str = r#"
return unitRows()
  .map((row) => {
    const control = buyControl(row);
    const offered = control
      ? `${control.textContent} ${control.getAttribute('title') || ''}`.trim()
      : '';
    return {
      name: rowLabel(row),
      owned: rowOwned(row),
      offered,
      purchasable: !!control && !isDisabled(control),
    };
  })
  .filter((row) => row.name.length > 0);
"#;

pub const OPEN_SURFACE: &str = r#"
const row = findRow(args.name);
if (!row || !buyControl(row)) return false;
const toggle = row.querySelector('.dropdown-toggle, [data-toggle="dropdown"]');
if (toggle) toggle.click();
return true;
"#;

pub const CLOSE_SURFACE: &str = r#"
document.body.click();
return true;
"#;

pub const POINTER_EVENT: &str = r#"
const el = buyControl(findRow(args.name));
if (!el) return false;
if (args.event === 'focus') {
  if (typeof el.focus === 'function') el.focus();
  el.dispatchEvent(new FocusEvent('focus'));
} else if (args.event === 'click') {
  el.click();
} else {
  el.dispatchEvent(new MouseEvent(args.event, { bubbles: true, cancelable: true, view: window }));
}
return true;
"#;

pub const TRIGGER_EVENT: &str = r#"
const el = buyControl(findRow(args.name));
if (!el) return false;
if (window.jQuery) {
  window.jQuery(el).trigger('click');
  return true;
}
if (window.angular && window.angular.element) {
  window.angular.element(el).triggerHandler('click');
  return true;
}
return false;
"#;

pub const ASCEND_FOR_HANDLER: &str = r#"
const el = buyControl(findRow(args.name));
if (!el || !window.angular) return null;
const expression = el.getAttribute('ng-click');
if (!expression) return null;
const fnName = expression.split('(')[0].trim();
let node = el;
for (let depth = 0; node && depth <= args.maxDepth; depth += 1) {
  const scope = window.angular.element(node).scope();
  if (scope && typeof scope[fnName] === 'function') return { depth, expression };
  node = node.parentElement;
}
return null;
"#;

pub const INVOKE_HANDLER: &str = r#"
let node = buyControl(findRow(args.name));
if (!node || !window.angular) return false;
for (let i = 0; node && i < args.depth; i += 1) node = node.parentElement;
if (!node) return false;
const scope = window.angular.element(node).scope();
if (!scope) return false;
if (scope.$root && scope.$root.$$phase) {
  scope.$eval(args.expression);
} else {
  scope.$apply(args.expression);
}
return true;
"#;

pub const SUBMIT_NATIVE: &str = r#"
const el = buyControl(findRow(args.name));
if (!el) return false;
const form = el.form || el.closest('form');
if (!form) return false;
if (typeof form.requestSubmit === 'function') {
  form.requestSubmit();
} else {
  form.submit();
}
return true;
"#;

pub const FOLLOW_LINK: &str = r#"
const el = buyControl(findRow(args.name));
if (!el) return false;
const href = (el.getAttribute('href') || '').trim();
if (href === '' || href === '#' || href.startsWith('javascript:')) return false;
window.location.assign(el.href);
return true;
"#;

pub const HAS_OVERFLOW_MENU: &str = r#"
return overflowMenu() !== null;
"#;

pub const OPEN_OVERFLOW_MENU: &str = r#"
const menu = overflowMenu();
if (!menu) return false;
menu.click();
return true;
"#;

pub const BULK_ACTION: &str = r#"
const link = document.querySelector(`a[ng-click*="${args.action}"]`);
if (!link || isDisabled(link)) return false;
link.click();
return true;
"#;

pub const SET_LABEL: &str = r#"
ensureControl().textContent = args.text;
return true;
"#;

pub const SET_TONE: &str = r#"
ensureControl().style.background = args.color;
return true;
"#;

pub const READ_CLICKS: &str = r#"
ensureControl();
return window.__autobuyerClicks || 0;
"#;

/// Builds the evaluable expression for `body` with `args` bound.
pub fn wrap(body: &str, args: &Value) -> String {
    format!("(function(args) {{\n{PRELUDE}\n{body}\n}})({args})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_binds_args_as_json() {
        let script = wrap(TAB_PRESENT, &json!({ "tab": "meat \"x\"" }));
        assert!(script.starts_with("(function(args) {"));
        assert!(script.ends_with(r#"})({"tab":"meat \"x\""})"#));
        assert!(script.contains("const findTab"));
    }

    #[test]
    fn prelude_uses_shared_names() {
        assert!(PRELUDE.contains(CONTROL_ID));
        assert!(PRELUDE.contains(CLICK_COUNTER));
    }
}
