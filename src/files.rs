use crate::config::Filenames;
use crate::options::{Query, RequestOptions};

/// Run index for an artifact request. Absent or zero falls back to run 1.
pub fn resolve_run(options: &RequestOptions) -> u32 {
    options.run.filter(|run| *run > 0).unwrap_or(1)
}

/// Server-side name of a secondary artifact file:
/// `"{run}{cached_marker}_{name}"`, e.g. `2_Cached_progress.csv`.
pub fn resolve_filename(name: &str, filenames: &Filenames, options: &RequestOptions) -> String {
    let run = resolve_run(options);
    let cached = if options.repeat_view {
        filenames.cached.as_str()
    } else {
        ""
    };
    format!("{run}{cached}_{name}")
}

/// Object form of the resolver: sets `run` and `cached` (1/0) directly on a
/// composite artifact-retrieval query instead of building a filename.
pub fn apply_view(query: &mut Query, options: &RequestOptions) {
    query.insert("run".to_string(), resolve_run(options).to_string());
    query.insert(
        "cached".to_string(),
        if options.repeat_view { "1" } else { "0" }.to_string(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_filename_defaults_to_first_run() {
        let filenames = Filenames::default();
        let options = RequestOptions::default();
        assert_eq!(
            resolve_filename("foo.txt", &filenames, &options),
            "1_foo.txt"
        );
    }

    #[test]
    fn test_resolve_filename_repeat_view() {
        let filenames = Filenames::default();
        let options = RequestOptions {
            run: Some(2),
            repeat_view: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_filename("foo.txt", &filenames, &options),
            "2_Cached_foo.txt"
        );
    }

    #[test]
    fn test_zero_run_falls_back_to_one() {
        let filenames = Filenames::default();
        let options = RequestOptions {
            run: Some(0),
            ..Default::default()
        };
        assert_eq!(
            resolve_filename("foo.txt", &filenames, &options),
            "1_foo.txt"
        );
    }

    #[test]
    fn test_apply_view_sets_run_and_cached_fields() {
        let mut query = Query::new();
        query.insert("test".to_string(), "230101_AB_1".to_string());

        apply_view(
            &mut query,
            &RequestOptions {
                run: Some(3),
                repeat_view: true,
                ..Default::default()
            },
        );

        assert_eq!(query.get("run").map(String::as_str), Some("3"));
        assert_eq!(query.get("cached").map(String::as_str), Some("1"));

        apply_view(&mut query, &RequestOptions::default());
        assert_eq!(query.get("run").map(String::as_str), Some("1"));
        assert_eq!(query.get("cached").map(String::as_str), Some("0"));
    }
}
