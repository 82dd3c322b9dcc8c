use ziwei_chart::calendar::solar_time::true_solar_time;
use ziwei_chart::chart::data::Horoscope;
use ziwei_chart::prompt::{default_system_prompt, master_prompt, natal_prompt, GREETING};
use ziwei_chart::{ChartData, Horizon};

fn sample_chart() -> ChartData {
    ChartData::from_json(include_str!("fixtures/sample_chart.json")).unwrap()
}

#[test]
fn test_natal_basic_info_prefers_solar_result() {
    let chart = sample_chart();
    let solar = true_solar_time(2000, 5, 23, 10, 50, 120.5).unwrap();
    let context = natal_prompt(&chart, Some(&solar));

    assert!(context.system.contains("# Role: 紫微斗数大师"));
    assert!(context.data_context.starts_with("【基本信息】\n性别：女\n地理经度：120.5\n钟表时间：2000-5-23 10:50\n"));
    assert!(context
        .data_context
        .contains(&format!("真太阳时：{}\n", solar.true_solar_time)));
    assert!(context.data_context.contains("农历时间：二〇〇〇年四月二十巳时\n"));
    assert!(context
        .data_context
        .contains("身主:天相; 命主:破军; 子年斗君:寅; 身宫:申\n\n\n【命盘十二宫】\n"));
}

#[test]
fn test_natal_falls_back_to_chart_time() {
    let context = natal_prompt(&sample_chart(), None);
    assert!(context.data_context.contains("地理经度：120.033\n"));
    assert!(context.data_context.contains("钟表时间：2000-5-23 09:00\n"));
    assert!(context.data_context.contains("真太阳时：2000-5-23 09:00\n"));
}

#[test]
fn test_natal_palace_tree() {
    let context = natal_prompt(&sample_chart(), None);
    let expected = "- 命宫宫 [壬午]\n\
                    \x20 ├主星 : 紫微[庙]\n\
                    \x20 ├辅星 : 文曲[旺]，左辅\n\
                    \x20 ├小星 : 红鸾，天喜，台辅\n\
                    \x20 ├神煞\n\
                    \x20 │ ├岁前星 : 岁建\n\
                    \x20 │ ├将前星 : 将星\n\
                    \x20 │ ├十二长生 : 长生\n\
                    \x20 │ ├太岁煞禄 : 博士\n\
                    \x20 ├大限 : 2~11虚岁\n\
                    \x20 ├小限 : 5，29，53虚岁\n\
                    \x20 └流年 : 17，41，65虚岁\n\n";
    assert!(context.data_context.contains(expected), "{}", context.data_context);
}

#[test]
fn test_missing_indicators_are_skipped() {
    let context = natal_prompt(&sample_chart(), None);
    assert!(context
        .data_context
        .contains("- 子女宫 [己卯]\n  ├主星 : 无\n  ├辅星 : 无\n  ├小星 : 无\n  ├神煞\n  │ ├十二长生 : 长生\n"));
}

#[test]
fn test_birth_transformation_marker_and_filtering() {
    let context = natal_prompt(&sample_chart(), None);
    assert!(context.data_context.contains("├主星 : 廉贞[利][↑禄]，天府[庙]\n"));
    assert!(context.data_context.contains("├小星 : 天姚\n"));
    assert!(!context.data_context.contains("<script>"));
}

#[test]
fn test_master_prompt_yearly_transformations() {
    let prompt = master_prompt("我适合创业吗？", &sample_chart(), 2026, Horizon::Yearly);

    assert!(prompt.starts_with("# Role: 资深的国学易经术数领域专家\n"));
    assert!(prompt.contains("命主：破军 | 身主：天相\n"));
    assert!(prompt.contains("当前流年：2026年 | 流年四化：['天同', '天机', '文昌', '廉贞'] (禄权科忌)\n"));
    assert!(prompt.contains("【命盘十二宫】\n│ │\n- 财帛宫[戊寅]\n│ │ ├主星 : 武曲[得][↑科]\n"));
    assert!(prompt.contains("│ │ └流年 : 13，37，61虚岁\n│ │\n"));
    assert!(prompt.contains("│ │\n\n\n# Task\n用户问题：\"我适合创业吗？\"\n"));
    assert!(prompt.contains("4. 结合大限与流年推断时间节点"));
}

#[test]
fn test_master_prompt_decadal_transformations() {
    let prompt = master_prompt("事业", &sample_chart(), 2026, Horizon::Decadal);
    assert!(prompt.contains("大限四化：['廉贞', '破军', '武曲', '太阳'] (禄权科忌)"));
    assert!(!prompt.contains("流年四化："));
}

#[test]
fn test_master_prompt_without_horoscope() {
    let mut chart = sample_chart();
    chart.horoscope = Horoscope::default();
    let prompt = master_prompt("事业", &chart, 2026, Horizon::Yearly);
    assert!(prompt.contains("流年四化：[] (禄权科忌)"));
}

#[test]
fn test_pipe_layout_closes_indicators() {
    let prompt = master_prompt("?", &sample_chart(), 2026, Horizon::Yearly);
    assert!(prompt.contains("│ │ ├神煞\n│ │ ├岁前星 : 岁建\n│ │ ├将前星 : 将星\n│ │ ├十二长生 : 长生\n│ │ └太岁煞禄 : 博士\n│ │ ├大限"));
}

#[test]
fn test_default_prompt_and_greeting() {
    let prompt = default_system_prompt();
    assert!(prompt.contains("由于没有提供具体的命盘数据"));
    assert!(!prompt.contains("【命盘十二宫】"));
    assert!(GREETING.starts_with("你好！"));
}
