//! 用户输入净化
//!
//! 所有来自客户端的文本在存储和比较之前都要先经过这里，
//! 去掉 HTML/标记片段并裁剪首尾空白。

/// 去除 `<...>` 标记片段并裁剪空白的纯函数。
///
/// 未闭合的 `<` 之后的内容全部丢弃，不会把半个标签留进存储。
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => output.push(ch),
            _ => {}
        }
    }

    output.trim().to_owned()
}
