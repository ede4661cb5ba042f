mod common;

use gocobertura::aggregate::{ConvertOptions, Converter};
use gocobertura::error::Error;
use gocobertura::ignore::{Ignore, IgnoreConfig};
use gocobertura::model::Coverage;
use gocobertura::resolve::GoModResolver;
use gocobertura::source::ClassGrouping;

fn convert(options: ConvertOptions) -> Coverage {
    let resolver = GoModResolver::new(common::fixture_module()).unwrap();
    Converter::new(&resolver, options)
        .with_timestamp(0)
        .convert_text(common::FIXTURE_PROFILE)
        .unwrap()
}

fn ignoring(config: IgnoreConfig) -> ConvertOptions {
    ConvertOptions {
        ignore: Ignore::new(&config).unwrap(),
        ..Default::default()
    }
}

#[test]
fn fixture_module_by_type() {
    let cov = convert(ConvertOptions::default());

    let names: Vec<&str> = cov.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["example.com/shop/cart", "example.com/shop"]);

    let cart = &cov.packages[0];
    // cart.go contributes "-" and "Cart"; zz_generated.go its own "Cart".
    let classes: Vec<(&str, &str)> = cart
        .classes
        .iter()
        .map(|c| (c.name.as_str(), c.file_name.as_str()))
        .collect();
    assert_eq!(
        classes,
        vec![
            ("-", "cart/cart.go"),
            ("Cart", "cart/cart.go"),
            ("Cart", "cart/zz_generated.go"),
        ]
    );

    let new = &cart.classes[0].methods[0];
    assert_eq!(new.name, "New");
    assert_eq!(new.line_rate, 1.0);

    let methods = &cart.classes[1].methods;
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].name, "Add");
    let add: Vec<(u32, u64)> = methods[0].lines.iter().map(|l| (l.number, l.hits)).collect();
    // Line 15 is claimed by two blocks (3 and 1); the lower count is kept.
    assert_eq!(add, vec![(14, 3), (15, 1), (16, 1), (17, 1), (18, 2), (19, 2)]);
    assert_eq!(methods[1].name, "Count");
    assert_eq!(methods[1].lines.len(), 6);
    assert_eq!(methods[1].line_rate, 0.0);
    assert_eq!(cart.classes[1].line_rate, 0.5);

    let main = &cov.packages[1];
    assert_eq!(main.classes[0].methods[0].name, "main");
    assert_eq!(main.classes[0].methods[0].lines.len(), 5);

    assert_eq!(cov.lines_valid, 23);
    assert_eq!(cov.lines_covered, 9);
    assert!((cov.line_rate - 9.0 / 23.0).abs() < 1e-9);
    assert_eq!(cov.sources.len(), 1);
}

#[test]
fn fixture_module_by_file() {
    let cov = convert(ConvertOptions {
        grouping: ClassGrouping::ByFile,
        ..Default::default()
    });

    let names: Vec<&str> = cov.packages[0].classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["cart.cart.go", "cart.zz_generated.go"]);
    assert_eq!(cov.packages[0].classes[0].methods.len(), 3);
    assert_eq!(cov.packages[1].classes[0].name, "main.go");
    assert_eq!(cov.lines_valid, 23);
}

#[test]
fn generated_files_are_skipped() {
    let cov = convert(ignoring(IgnoreConfig {
        generated: true,
        ..Default::default()
    }));

    assert_eq!(cov.packages[0].classes.len(), 2);
    assert_eq!(cov.lines_valid, 20);
    assert_eq!(cov.lines_covered, 9);
}

#[test]
fn ignored_dirs_drop_whole_packages() {
    let cov = convert(ignoring(IgnoreConfig {
        dirs: Some("^cart$".to_string()),
        ..Default::default()
    }));

    assert_eq!(cov.packages.len(), 1);
    assert_eq!(cov.packages[0].name, "example.com/shop");
    assert_eq!(cov.lines_covered, 0);
    assert_eq!(cov.line_rate, 0.0);
}

#[test]
fn test_file_only_profile_with_test_pattern() {
    let resolver = GoModResolver::new(common::fixture_module()).unwrap();
    let options = ignoring(IgnoreConfig {
        paths: Some(r".*_test\.go$".to_string()),
        ..Default::default()
    });
    let profile = "mode: set\nexample.com/shop/cart/cart_test.go:5.28,7.39 2 1\n";

    let cov = Converter::new(&resolver, options).convert_text(profile).unwrap();
    assert!(cov.packages.is_empty());
    assert_eq!(cov.lines_valid, 0);
}

#[test]
fn rates_are_consistent_at_every_level() {
    let cov = convert(ConvertOptions::default());

    for pkg in &cov.packages {
        let total: u64 = pkg.classes.iter().map(|c| c.num_lines()).sum();
        let hit: u64 = pkg.classes.iter().map(|c| c.num_lines_with_hits()).sum();
        assert!((pkg.line_rate - hit as f64 / total as f64).abs() < 1e-9);
        for class in &pkg.classes {
            let flattened: usize = class.methods.iter().map(|m| m.lines.len()).sum();
            assert_eq!(class.lines.len(), flattened);
            for method in &class.methods {
                let numbers: Vec<u32> = method.lines.iter().map(|l| l.number).collect();
                assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
    assert!((cov.line_rate - cov.lines_covered as f64 / cov.lines_valid as f64).abs() < 1e-9);
}

#[test]
fn duplicate_blocks_take_the_lower_count() {
    let dir = common::temp_module(
        "example.com/foo",
        &[("foo.go", "package foo\n\nfunc F() {\n\ta()\n\tb()\n}\n")],
    );
    let resolver = GoModResolver::new(dir.path()).unwrap();
    let profile = "mode: count\nexample.com/foo/foo.go:3.1,5.2 2 1\nexample.com/foo/foo.go:3.1,5.2 2 0\n";

    let cov = Converter::new(&resolver, ConvertOptions::default())
        .convert_text(profile)
        .unwrap();

    let method = &cov.packages[0].classes[0].methods[0];
    let lines: Vec<(u32, u64)> = method.lines.iter().map(|l| (l.number, l.hits)).collect();
    assert_eq!(lines, vec![(3, 0), (4, 0), (5, 0)]);
    assert_eq!(method.line_rate, 0.0);
}

#[test]
fn concatenated_runs_are_rejected() {
    let dir = common::temp_module(
        "example.com/foo",
        &[(
            "foo.go",
            "package foo\n\nfunc A() {\n\ta()\n}\n\nfunc B() {\n\tb()\n}\n",
        )],
    );
    let resolver = GoModResolver::new(dir.path()).unwrap();
    let profile = "mode: count\n\
        example.com/foo/foo.go:3.10,5.2 1 4\n\
        example.com/foo/foo.go:7.10,9.2 1 4\n\
        mode: count\n\
        example.com/foo/foo.go:3.10,5.2 1 0\n\
        example.com/foo/foo.go:7.10,9.2 1 0\n";

    let err = Converter::new(&resolver, ConvertOptions::default())
        .convert_text(profile)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedProfile { line: 4, .. }));
}

#[test]
fn lines_shared_by_two_functions_count_once() {
    let dir = common::temp_module(
        "example.com/foo",
        &[("foo.go", "package foo\n\nfunc A() { a() }; func B() { b() }\n")],
    );
    let resolver = GoModResolver::new(dir.path()).unwrap();
    let profile = "mode: count\n\
        example.com/foo/foo.go:3.10,3.17 1 5\n\
        example.com/foo/foo.go:3.28,3.35 1 0\n";

    let cov = Converter::new(&resolver, ConvertOptions::default())
        .convert_text(profile)
        .unwrap();

    let class = &cov.packages[0].classes[0];
    assert_eq!(class.methods.len(), 2);
    let lines: Vec<(u32, u64)> = class.lines.iter().map(|l| (l.number, l.hits)).collect();
    assert_eq!(lines, vec![(3, 0)]);
    assert_eq!(class.line_rate, 0.0);
    assert_eq!(cov.packages[0].line_rate, 0.0);
    assert_eq!(cov.lines_valid, 1);
    assert_eq!(cov.lines_covered, 0);
}

#[test]
fn file_outside_module_is_fatal() {
    let resolver = GoModResolver::new(common::fixture_module()).unwrap();
    let profile = "mode: set\ngithub.com/vendor/lib/lib.go:1.1,2.2 1 1\n";
    let err = Converter::new(&resolver, ConvertOptions::default())
        .convert_text(profile)
        .unwrap_err();
    assert!(matches!(err, Error::PackageNotFound { ref file } if file == "github.com/vendor/lib/lib.go"));
}

#[test]
fn missing_source_file_is_fatal() {
    let resolver = GoModResolver::new(common::fixture_module()).unwrap();
    let profile = "mode: set\nexample.com/shop/cart/gone.go:1.1,2.2 1 1\n";
    let err = Converter::new(&resolver, ConvertOptions::default())
        .convert_text(profile)
        .unwrap_err();
    assert!(matches!(err, Error::PackageNotFound { .. }));
}
