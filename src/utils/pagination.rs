use serde::Serialize;

/// One page of a cursor-paginated listing. `next_cursor` is `None` once the
/// listing is exhausted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Turn a `limit + 1` probe fetch into a page. If the probe row is present
/// there is a further page; it is trimmed and the next cursor is the ID of
/// the last row of the trimmed page.
pub fn trim_page<T>(mut rows: Vec<T>, limit: i64, cursor_of: impl Fn(&T) -> String) -> Page<T> {
    let has_next = rows.len() as i64 > limit;
    if has_next {
        rows.pop();
    }

    let next_cursor = if has_next {
        rows.last().map(&cursor_of)
    } else {
        None
    };

    Page {
        items: rows,
        next_cursor,
    }
}

/// Clamp a caller-supplied page size to something sane.
pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: i64) -> Vec<i64> {
        (0..n).rev().collect()
    }

    #[test]
    fn full_probe_trims_and_points_at_last_kept_row() {
        let page = trim_page(ids(11), 10, |id| id.to_string());
        assert_eq!(page.items.len(), 10);
        // probe row (id 0) trimmed, cursor is the last *kept* row
        assert_eq!(page.next_cursor.as_deref(), Some("1"));
    }

    #[test]
    fn short_page_is_terminal() {
        let page = trim_page(ids(4), 10, |id| id.to_string());
        assert_eq!(page.items.len(), 4);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn exact_limit_without_probe_is_terminal() {
        let page = trim_page(ids(10), 10, |id| id.to_string());
        assert_eq!(page.items.len(), 10);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn empty_page() {
        let page = trim_page(Vec::<i64>::new(), 10, |id| id.to_string());
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn walking_cursors_visits_every_item_once() {
        // Simulate the DB: 25 items, newest first, cursor filters strictly older.
        let all: Vec<i64> = (0..25).rev().collect();
        let limit = 10i64;
        let mut seen = Vec::new();
        let mut cursor: Option<i64> = None;

        loop {
            let window: Vec<i64> = all
                .iter()
                .copied()
                .filter(|id| cursor.is_none_or(|c| *id < c))
                .take(limit as usize + 1)
                .collect();
            let page = trim_page(window, limit, |id| id.to_string());
            seen.extend(page.items.iter().copied());
            match page.next_cursor {
                Some(c) => cursor = Some(c.parse().unwrap()),
                None => break,
            }
        }

        assert_eq!(seen, all);
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None, 10), 10);
        assert_eq!(clamp_limit(Some(20), 10), 20);
        assert_eq!(clamp_limit(Some(0), 10), 1);
        assert_eq!(clamp_limit(Some(-3), 10), 1);
        assert_eq!(clamp_limit(Some(10_000), 10), 100);
    }
}
