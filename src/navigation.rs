use std::collections::BTreeMap;

pub type RouteParams = BTreeMap<String, String>;

pub const QUIZ_ROUTE: &str = "Quiz";
pub const RESULT_ROUTE: &str = "QuizResult";
pub const DASHBOARD_ROUTE: &str = "Dashboard";

/// Screen stack owned by the UI. Calls are fire-and-forget.
pub trait Navigator {
    fn go_to(&mut self, route: &str, params: RouteParams);
    fn go_back(&mut self);
    fn reset(&mut self, route: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub route: String,
    pub params: RouteParams,
}

/// In-memory navigation stack for headless front ends and tests.
#[derive(Clone, Debug, Default)]
pub struct NavigationStack {
    screens: Vec<Screen>,
}

impl NavigationStack {
    pub fn new(root: &str) -> Self {
        let mut stack = Self::default();
        stack.reset(root);
        stack
    }

    pub fn current(&self) -> Option<&Screen> {
        self.screens.last()
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }
}

impl Navigator for NavigationStack {
    fn go_to(&mut self, route: &str, params: RouteParams) {
        self.screens.push(Screen {
            route: route.to_string(),
            params,
        });
    }

    /// The root screen is never popped.
    fn go_back(&mut self) {
        if self.screens.len() > 1 {
            self.screens.pop();
        }
    }

    fn reset(&mut self, route: &str) {
        self.screens.clear();
        self.screens.push(Screen {
            route: route.to_string(),
            params: RouteParams::new(),
        });
    }
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn go_to(&mut self, route: &str, params: RouteParams) {
        (**self).go_to(route, params)
    }

    fn go_back(&mut self) {
        (**self).go_back()
    }

    fn reset(&mut self, route: &str) {
        (**self).reset(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_reset() {
        let mut nav = NavigationStack::new(DASHBOARD_ROUTE);
        nav.go_to(QUIZ_ROUTE, RouteParams::from([("category".to_string(), "A".to_string())]));
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.current().unwrap().params["category"], "A");

        nav.go_back();
        assert_eq!(nav.current().unwrap().route, DASHBOARD_ROUTE);
        nav.go_back();
        assert_eq!(nav.depth(), 1);

        nav.go_to(QUIZ_ROUTE, RouteParams::new());
        nav.go_to(RESULT_ROUTE, RouteParams::new());
        nav.reset(DASHBOARD_ROUTE);
        assert_eq!(nav.depth(), 1);
    }
}
