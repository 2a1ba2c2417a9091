//! Hand-written records matching `graph/settings.json`, with their generated
//! companions pulled in from `OUT_DIR`.

pub mod settings {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum Theme {
        #[default]
        Light,
        Dark,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TestRecord {
        pub name: String,
        pub count: u32,
        pub inner: test_record::InnerTestRecord,
        pub window: Window,
    }

    impl mutable_test_record::Source for TestRecord {
        fn name(&self) -> &String {
            &self.name
        }
        fn count(&self) -> &u32 {
            &self.count
        }
        fn inner(&self) -> &test_record::InnerTestRecord {
            &self.inner
        }
        fn window(&self) -> &Window {
            &self.window
        }
    }

    pub mod test_record {
        use serde::{Deserialize, Serialize};

        use super::mutable_test_record::mutable_inner_test_record;

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct InnerTestRecord {
            pub flag: bool,
            pub tags: Vec<String>,
            pub leaf: inner_test_record::Leaf,
        }

        impl mutable_inner_test_record::Source for InnerTestRecord {
            fn flag(&self) -> &bool {
                &self.flag
            }
            fn tags(&self) -> &Vec<String> {
                &self.tags
            }
            fn leaf(&self) -> &inner_test_record::Leaf {
                &self.leaf
            }
        }

        pub mod inner_test_record {
            use serde::{Deserialize, Serialize};

            use super::mutable_inner_test_record::mutable_leaf;

            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct Leaf {
                pub value: i64,
                #[serde(default)]
                pub label: Option<String>,
            }

            impl mutable_leaf::Source for Leaf {
                fn value(&self) -> &i64 {
                    &self.value
                }
                fn label(&self) -> &Option<String> {
                    &self.label
                }
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Window {
        pub width: u32,
        pub height: u32,
        pub title: String,
        #[serde(default)]
        pub theme: Theme,
    }

    impl mutable_window::Source for Window {
        fn width(&self) -> &u32 {
            &self.width
        }
        fn height(&self) -> &u32 {
            &self.height
        }
        fn title(&self) -> &String {
            &self.title
        }
        fn theme(&self) -> &Theme {
            &self.theme
        }
    }

    include!(concat!(env!("OUT_DIR"), "/settings/mutable_test_record.rs"));
    include!(concat!(env!("OUT_DIR"), "/settings/mutable_window.rs"));

    impl Default for TestRecord {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                count: 0,
                inner: test_record::InnerTestRecord {
                    flag: true,
                    tags: Vec::new(),
                    leaf: test_record::inner_test_record::Leaf { value: 0, label: None },
                },
                window: Window { width: 800, height: 600, title: "main".to_string(), theme: Theme::Light },
            }
        }
    }
}
