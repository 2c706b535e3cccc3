//! Nested command completion tree: `flash {set,get,clear,cat,all}`,
//! `system {status,diag,mode,upgrade}`, `wan {ppp_pppoe,ppp_ptpt,ppp_l2tp,ip}`,
//! `exit`. Ported from the reference's own example program, which walks
//! space-delimited tokens down a table of tables rather than a single flat
//! list.

use rline_completion::MenuSink;

struct Node {
    name: &'static str,
    children: &'static [Node],
}

const WAN: &[Node] = &[
    Node { name: "ppp_pppoe", children: &[] },
    Node { name: "ppp_ptpt", children: &[] },
    Node { name: "ppp_l2tp", children: &[] },
    Node { name: "ip", children: &[] },
];

const FLASH: &[Node] = &[
    Node { name: "set", children: &[] },
    Node { name: "get", children: &[] },
    Node { name: "clear", children: &[] },
    Node { name: "cat", children: &[] },
    Node { name: "all", children: &[] },
];

const SYSTEM: &[Node] = &[
    Node { name: "status", children: &[] },
    Node { name: "diag", children: &[] },
    Node { name: "mode", children: &[] },
    Node { name: "upgrade", children: &[] },
];

const ROOT: &[Node] = &[
    Node { name: "flash", children: FLASH },
    Node { name: "system", children: SYSTEM },
    Node { name: "wan", children: WAN },
    Node { name: "exit", children: &[] },
];

/// Longest common prefix of two strings, in bytes (both operands are ASCII
/// command names here, so byte and char boundaries coincide).
fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let n = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..n]
}

/// Walk `text` token by token against `list`, completing the token the
/// cursor sits in. Mirrors `rl_get_completion` from the reference: a token
/// fully typed and followed by a space descends into that entry's
/// children; the token containing the cursor is matched by prefix against
/// the current level.
pub fn complete_command(line: &[u8], cursor: usize, menu: &mut dyn MenuSink) -> Option<String> {
    let text = std::str::from_utf8(line).ok()?;
    let mut list: &[Node] = ROOT;
    let mut tok_start = 0usize;

    loop {
        let rest = &text[tok_start..];
        let tok_len = rest.find(' ').unwrap_or(rest.len());
        let tok_end = tok_start + tok_len;

        if cursor <= tok_end {
            let typed = &text[tok_start..cursor];
            let mut matches: Vec<&str> = Vec::new();
            let mut common: Option<&str> = None;
            for node in list {
                if !node.name.starts_with(typed) {
                    continue;
                }
                matches.push(node.name);
                let suffix = &node.name[typed.len()..];
                common = Some(match common {
                    None => suffix,
                    Some(c) => common_prefix(c, suffix),
                });
            }

            if matches.is_empty() {
                return None;
            }
            if matches.len() == 1 {
                return Some(format!("{} ", common.unwrap_or("")));
            }
            if let Some(extra) = common.filter(|c| !c.is_empty()) {
                return Some(extra.to_string());
            }

            let mut options: Vec<String> = matches.iter().map(|s| s.to_string()).collect();
            menu.print_options(&mut options);
            return None;
        }

        let token = &text[tok_start..tok_end];
        match list.iter().find(|node| node.name == token) {
            Some(node) if !node.children.is_empty() => list = node.children,
            _ => return None,
        }

        tok_start = tok_end;
        while text[tok_start..].starts_with(' ') {
            tok_start += 1;
        }
    }
}
