//! Templates and functions evaluated through the engine

use chrono::{FixedOffset, TimeZone};
use pretty_assertions::assert_eq;
use simple_lang::{
    EvaluationContext, EvaluationError, ExceptionInfo, FileInfo, FileResourceLoader,
    LanguageConfig, Message, SimpleError, SimpleLanguage, SimpleValue,
};

fn order_message() -> Message {
    let body: serde_json::Value = serde_json::json!({
        "id": 7,
        "address": { "city": "Oslo", "lines": ["Storgata 1", "0155"] },
        "items": [ { "sku": "A-1" }, { "sku": "B-2" } ]
    });
    Message::new()
        .with_id("msg-1")
        .with_body(body)
        .with_header("name", "Claus")
        .with_header("key", "name")
        .with_header("count", "41")
        .with_header(
            "tags",
            SimpleValue::List(vec![SimpleValue::from("red"), SimpleValue::from("blue")]),
        )
        .with_property("region", "north")
}

fn eval(text: &str, message: &Message) -> SimpleValue {
    SimpleLanguage::new()
        .evaluate(text, message)
        .unwrap_or_else(|e| panic!("{text}: {e}"))
}

fn eval_text(text: &str, message: &Message) -> String {
    eval(text, message).to_text()
}

#[test]
fn test_template_interpolation() {
    let message = order_message();
    assert_eq!(eval_text("Hello ${header.name}!", &message), "Hello Claus!");
    assert_eq!(eval_text("Hello $simple{header.name}!", &message), "Hello Claus!");
    assert_eq!(eval_text("${id} from ${exchangeProperty.region}", &message), "msg-1 from north");
    assert_eq!(eval_text("Missing: [${header.missing}]", &message), "Missing: []");
}

#[test]
fn test_operator_words_in_templates_are_text() {
    let message = Message::new().with_header("qty", 5).with_header("name", "Order");
    assert_eq!(eval_text("${header.qty} in stock", &message), "5 in stock");
    assert_eq!(eval_text("${header.name} is ready", &message), "Order is ready");
    assert_eq!(
        eval_text("${header.name} contains 3 items", &message),
        "Order contains 3 items"
    );
    assert_eq!(
        eval_text("${header.name} starts with a letter", &message),
        "Order starts with a letter"
    );

    let language = SimpleLanguage::new();
    assert!(language.matches("${header.qty} in '4,5'", &message).unwrap());
    assert!(language.compile_predicate("${header.name} is ready").unwrap_err().is_syntax());
}

#[test]
fn test_single_function_keeps_its_type() {
    let message = Message::new().with_body(42).with_header("flag", true);
    assert_eq!(eval("${body}", &message), SimpleValue::from(42));
    assert_eq!(eval("${header.flag}", &message), SimpleValue::Boolean(true));
    assert_eq!(eval("${bodyType}", &message).to_text(), "Integer");
}

#[test]
fn test_legacy_expressions() {
    let message = Message::new().with_body("payload").with_header("foo", "bar");
    assert_eq!(eval("body", &message), SimpleValue::from("payload"));
    assert_eq!(eval("header.foo", &message), SimpleValue::from("bar"));
    assert_eq!(eval("Hello World", &message), SimpleValue::from("Hello World"));

    let modern_only = SimpleLanguage::with_config(LanguageConfig {
        legacy_syntax: false,
        ..LanguageConfig::default()
    });
    assert_eq!(
        modern_only.evaluate("header.foo", &message).unwrap(),
        SimpleValue::from("header.foo")
    );
}

#[test]
fn test_escape_sequences() {
    let message = Message::new();
    assert_eq!(eval_text("line1\\nline2", &message), "line1\nline2");
    assert_eq!(eval_text("a\\tb", &message), "a\tb");

    let raw = SimpleLanguage::with_config(LanguageConfig {
        allow_escape: false,
        ..LanguageConfig::default()
    });
    assert_eq!(
        raw.evaluate("line1\\nline2", &message).unwrap().to_text(),
        "line1\\nline2"
    );
}

#[test]
fn test_body_navigation() {
    let message = order_message();
    assert_eq!(eval_text("${body.address.city}", &message), "Oslo");
    assert_eq!(eval_text("${body.address.lines[last]}", &message), "0155");
    assert_eq!(eval_text("${body.items[1].sku}", &message), "B-2");
    assert_eq!(eval("${body.items.size}", &message), SimpleValue::from(2));
    assert_eq!(eval_text("${header.tags[last]}", &message), "blue");
    assert_eq!(eval_text("${header.tags[0]}", &message), "red");
}

#[test]
fn test_null_safe_navigation() {
    let message = Message::new().with_body(serde_json::json!({ "customer": null }));
    assert_eq!(eval("${body.customer?.name}", &message), SimpleValue::Null);

    let err = SimpleLanguage::new()
        .evaluate("${body.customer.name}", &message)
        .unwrap_err();
    assert!(matches!(
        err,
        SimpleError::Evaluation(EvaluationError::NullNavigation { .. })
    ));
}

#[test]
fn test_body_conversion() {
    let message = Message::new().with_body("123");
    assert_eq!(eval("${bodyAs(Integer)}", &message), SimpleValue::from(123));
    assert_eq!(eval("${bodyAs(String)}", &message), SimpleValue::from("123"));

    let empty = Message::new();
    assert_eq!(eval("${bodyAs(String)}", &empty), SimpleValue::Null);
    let err = SimpleLanguage::new()
        .evaluate("${mandatoryBodyAs(String)}", &empty)
        .unwrap_err();
    assert!(matches!(
        err,
        SimpleError::Evaluation(EvaluationError::MandatoryBody { .. })
    ));
}

#[test]
fn test_exception_and_environment() {
    let message = Message::new()
        .with_exception(ExceptionInfo::new("IllegalStateException", "Forced"))
        .with_system_property("app.mode", "test");
    assert_eq!(eval_text("${exception.message}", &message), "Forced");
    assert_eq!(
        eval_text("Failed: ${exception}", &message),
        "Failed: IllegalStateException: Forced"
    );
    assert_eq!(eval_text("${sys.app.mode}", &message), "test");
    assert_eq!(
        eval_text("${sysenv.PATH}", &message),
        std::env::var("PATH").unwrap_or_default()
    );
    assert_eq!(eval("${sysenv.SIMPLE_LANG_SURELY_UNSET}", &message), SimpleValue::Null);
}

#[test]
fn test_date_functions() {
    let birthday = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(1974, 4, 20, 8, 30, 0)
        .unwrap();
    let message = Message::new().with_header("birthday", birthday);
    assert_eq!(eval_text("${date:header.birthday:yyyy-MM-dd}", &message), "1974-04-20");
    assert_eq!(
        eval_text("${date-with-timezone:header.birthday:GMT+2:HH:mm}", &message),
        "10:30"
    );

    let year = chrono::Local::now().format("%Y").to_string();
    assert_eq!(eval_text("${date:now:yyyy}", &message), year);
}

fn greeter(method: Option<&str>, context: &dyn EvaluationContext) -> Result<SimpleValue, EvaluationError> {
    match method {
        Some("greet") => Ok(SimpleValue::from(format!("Hi {}", context.body().to_text()))),
        _ => Ok(SimpleValue::from("greeter")),
    }
}

#[test]
fn test_beans_references_and_placeholders() {
    let message = Message::new()
        .with_body("Ada")
        .with_bean("greeter", greeter)
        .with_placeholder("default", "queue", "orders")
        .with_placeholder("prod.properties", "queue", "orders-prod");
    assert_eq!(eval_text("${bean:greeter.greet}", &message), "Hi Ada");
    assert_eq!(eval_text("${ref:greeter}", &message), "greeter");
    assert_eq!(eval_text("[${ref:missing}]", &message), "[]");
    assert_eq!(eval_text("${properties:queue}", &message), "orders");
    assert_eq!(eval_text("${properties:prod.properties:queue}", &message), "orders-prod");

    let err = SimpleLanguage::new()
        .evaluate("${properties:nope}", &message)
        .unwrap_err();
    assert!(matches!(
        err,
        SimpleError::Evaluation(EvaluationError::PlaceholderNotFound { ref key, .. }) if key == "nope"
    ));
}

#[test]
fn test_nested_and_unary_functions() {
    let message = order_message();
    assert_eq!(eval_text("${header.${header.key}}", &message), "Claus");
    assert_eq!(eval("${header.count}++", &message), SimpleValue::from(42));
    assert_eq!(eval("${header.count}--", &message), SimpleValue::from(40));
}

#[test]
fn test_unrecognised_text_is_looked_up() {
    let message = order_message();
    assert_eq!(eval_text("${name}", &message), "Claus");
    assert_eq!(eval_text("${region}", &message), "north");
    assert_eq!(eval_text("${address.city}", &message), "Oslo");

    let err = SimpleLanguage::new()
        .evaluate("Hello ${nowhere}", &message)
        .unwrap_err();
    assert!(matches!(
        err,
        SimpleError::Evaluation(EvaluationError::Unresolved { .. })
    ));
}

#[test]
fn test_syntax_errors_report_positions() {
    let language = SimpleLanguage::new();

    let err = language.compile_expression("${a").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.position(), Some(0));

    let err = language.compile_expression("abc ${bodyAs(String}").unwrap_err();
    assert_eq!(err.position(), Some(6));
    assert!(err.to_string().contains("abc ${bodyAs(String}"));

    assert!(language.compile_expression("${date:yyyyMMdd}").unwrap_err().is_syntax());
}

#[test]
fn test_file_functions() {
    let file = FileInfo::new("orders-2024.csv", "inbox/orders-2024.csv").with_length(512);
    let message = Message::new().with_file(file);
    let language = SimpleLanguage::new().with_file_functions();

    let eval = |text: &str| language.evaluate(text, &message).unwrap();
    assert_eq!(eval("${file:name}").to_text(), "orders-2024.csv");
    assert_eq!(eval("${file:ext}").to_text(), "csv");
    assert_eq!(eval("${file:onlyname.noext}").to_text(), "orders-2024");
    assert_eq!(eval("${file:length}"), SimpleValue::from(512));
    assert_eq!(eval("Processing ${file:onlyname}").to_text(), "Processing orders-2024.csv");

    assert!(language.compile_expression("${file:color}").unwrap_err().is_syntax());
}

#[test]
fn test_expression_loaded_from_file() {
    let dir = std::env::temp_dir().join(format!("simple-lang-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("greeting.txt"), "Dear ${header.name}\r\n").unwrap();

    let language = SimpleLanguage::new().with_resource_loader(FileResourceLoader::with_base_dir(&dir));
    let message = order_message();
    assert_eq!(
        language
            .evaluate("resource:file:greeting.txt", &message)
            .unwrap()
            .to_text(),
        "Dear Claus"
    );

    let err = language
        .evaluate("resource:file:missing.txt", &message)
        .unwrap_err();
    assert!(matches!(err, SimpleError::Resource { .. }));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_built_in_calls() {
    let message = order_message();
    assert_eq!(eval_text("${substring(0,2,${header.name})}", &message), "Cla");
    assert_eq!(eval_text("${substringBetween(${header.key},'a','e')}", &message), "m");
    assert_eq!(eval_text("${join(';','#',${header.tags})}", &message), "#red;#blue");
    assert_eq!(eval("${size(${header.tags})}", &message), SimpleValue::from(2));
    assert_eq!(
        eval_text("${iif(${header.name} == 'Claus',yes,no)}", &message),
        "yes"
    );
    assert_eq!(
        eval_text("${iif(${header.count} > 100,big,small)}", &message),
        "small"
    );
    assert_eq!(
        eval("${map(total,${header.count})}", &message),
        SimpleValue::object([("total", SimpleValue::from("41"))])
    );

    let dashed = Message::new().with_body("  a-b-c  ");
    assert_eq!(eval_text("${trim()}", &dashed), "a-b-c");
    assert_eq!(eval_text("[${replace(-,+)}]", &dashed), "[  a+b+c  ]");
    assert_eq!(eval_text("trim()", &dashed), "trim()");
}

#[test]
fn test_call_syntax_errors() {
    let language = SimpleLanguage::new();
    let err = language.compile_expression("${iif(a,b)}").unwrap_err();
    assert!(err.is_syntax());
    assert!(err.to_string().contains("iif(predicate,trueExpression,falseExpression)"));
    assert!(language.compile_expression("${map(a)}").unwrap_err().is_syntax());
}

#[test]
fn test_variables_and_generators() {
    let message = order_message()
        .with_variable("user", SimpleValue::object([("name", SimpleValue::from("Ada"))]))
        .with_placeholder("default", "queue", "orders");
    assert_eq!(eval_text("Hi ${variable.user.name}", &message), "Hi Ada");
    assert_eq!(eval("${variables.size}", &message), SimpleValue::from(1));
    assert_eq!(eval("${propertiesExist:queue}", &message), SimpleValue::from(true));
    assert!(
        SimpleLanguage::new()
            .matches("${propertiesExist:!missing}", &message)
            .unwrap()
    );

    assert_eq!(eval_text("${uuid}", &message).len(), 36);
    assert_eq!(eval("${empty(list)}", &message), SimpleValue::List(vec![]));
    let SimpleValue::Integer(roll) = eval("${random(1,7)}", &message) else {
        panic!("expected an integer");
    };
    assert!((1..7).contains(&roll));
}
