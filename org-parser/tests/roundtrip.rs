//! Serialization stability: one parse/serialize pass reaches a fixed point.

use org_parser::{parse_str, serialize_document};
use proptest::prelude::*;

fn canonical(text: &str) -> String {
    serialize_document(&parse_str(text))
}

#[test]
fn kitchen_sink_reaches_fixed_point() {
    let source = "\
#+TITLE: Kitchen sink
#+FILETAGS: :project:notes:

Intro paragraph with [[file:other.org][a link]] and *emphasis*.

* TODO [#A] First heading :alpha:
:PROPERTIES:
:ID: 11111111-1111-1111-1111-111111111111
:END:
Body with a timestamp <2024-06-01 Sat> and [fn:mark].

- item one
  continuation
  - nested item
- item two

| Name | Qty |
|------+-----|
| bolt | 12  |

#+begin_src sh
echo unchanged   content
#+end_src

** DONE Child [1/2]
Child body.

[fn:mark] A footnote definition.

* Second heading
-----
";
    let once = canonical(source);
    let twice = canonical(&once);
    assert_eq!(twice, once, "second pass must not change the text");
}

#[test]
fn pathological_spacing_stabilizes() {
    let source = "* A\n\n\n\n* B\n\n\nText   \n\n\n\n- x\n- y\n";
    let once = canonical(source);
    assert_eq!(canonical(&once), once);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_fragment_soup_stabilizes(
        fragments in prop::collection::vec(
            prop_oneof![
                Just("* Heading"),
                Just("** Sub heading :tag:"),
                Just("plain text line"),
                Just("more text"),
                Just(""),
                Just("- bullet"),
                Just("1. numbered"),
                Just("| a | b |"),
                Just("#+KEY: value"),
                Just("#+begin_src sh"),
                Just("#+end_src"),
                Just(":PROPERTIES:"),
                Just(":ID: abc"),
                Just(":END:"),
                Just("-----"),
            ],
            0..24,
        )
    ) {
        let source = fragments.join("\n");
        let once = canonical(&source);
        prop_assert_eq!(canonical(&once), once);
    }
}
