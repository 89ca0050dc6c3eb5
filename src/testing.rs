//! 单元测试用的内存页面与协作方
//!
//! `FakePage` 用一组带"匹配键"的节点模拟 DOM：节点的键就是能找到它的
//! CSS/XPath 表达式原文。节点可以归属某个"画面"（表单的某一步），
//! 点击可以切换画面，从而脚本化整个多步表单。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::infrastructure::{ElementHandle, Matcher, PageDriver};
use crate::models::{normalize_question, Job, QuestionKind};
use crate::services::collaborators::{
    ArtifactGenerator, GenerationError, QuestionAnswerer, ResolvedAnswer, UploadPurpose,
};
use crate::services::llm_service::classify_upload_label;

/// 点击节点的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickEffect {
    None,
    /// 切换到指定画面
    ShowScreen(usize),
    /// 点击失败
    Fail,
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    keys: Vec<String>,
    parent: Option<ElementHandle>,
    text: String,
    attrs: HashMap<String, String>,
    visible: bool,
    clickable: bool,
    screen: Option<usize>,
    after_reloads: usize,
    on_click: ClickEffect,
}

impl FakeNode {
    pub fn new(key: &str) -> Self {
        Self {
            keys: vec![key.to_string()],
            parent: None,
            text: String::new(),
            attrs: HashMap::new(),
            visible: true,
            clickable: true,
            screen: None,
            after_reloads: 0,
            on_click: ClickEffect::None,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child_of(mut self, parent: ElementHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.clickable = false;
        self
    }

    /// 只在指定画面存在
    pub fn on_screen(mut self, screen: usize) -> Self {
        self.screen = Some(screen);
        self
    }

    /// 刷新一次后才渲染
    pub fn appears_after_reload(mut self) -> Self {
        self.after_reloads = 1;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    source: String,
    nodes: Vec<FakeNode>,
    screen: usize,
    reloads: usize,
    redirect_to: Option<String>,
    redirects_left: usize,
    url_reads: usize,
    redirect_on_read: Option<(usize, String)>,
    /// 每次导航或刷新加一，之前查到的句柄随之失效
    generation: usize,
    issued: HashMap<ElementHandle, usize>,
    navigations: Vec<String>,
    clicks: Vec<ElementHandle>,
    typed: Vec<(ElementHandle, String)>,
    selected: Vec<(ElementHandle, String)>,
    files: Vec<(ElementHandle, PathBuf)>,
    revealed: Vec<ElementHandle>,
    scrolls: Vec<u64>,
    blurs: usize,
}

impl FakeState {
    fn index(handle: ElementHandle) -> usize {
        (handle.id() - 1) as usize
    }

    fn node(&self, handle: ElementHandle) -> Result<&FakeNode> {
        self.nodes
            .get(Self::index(handle))
            .ok_or_else(|| anyhow!("未知元素句柄 {}", handle.id()))
    }

    fn is_present(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        node.screen.map_or(true, |s| s == self.screen) && self.reloads >= node.after_reloads
    }

    fn live(&self, handle: ElementHandle) -> Result<&FakeNode> {
        let node = self.node(handle)?;
        if !self.is_present(Self::index(handle)) {
            bail!("元素已失效: {}", handle.id());
        }
        if let Some(&generation) = self.issued.get(&handle) {
            if generation != self.generation {
                bail!("元素句柄来自旧页面: {}", handle.id());
            }
        }
        Ok(node)
    }

    fn next_generation(&mut self) {
        self.generation += 1;
        self.screen = 0;
    }

    fn is_descendant(&self, index: usize, ancestor: ElementHandle) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(Self::index(parent)).and_then(|n| n.parent);
        }
        false
    }
}

/// 脚本化的内存页面
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.to_string(),
                source: "<html></html>".to_string(),
                ..Default::default()
            }),
        }
    }

    /// 添加节点；未指定画面的子节点继承父节点的画面
    pub fn add(&self, mut node: FakeNode) -> ElementHandle {
        let mut state = self.state.lock().unwrap();
        if node.screen.is_none() {
            if let Some(parent) = node.parent {
                node.screen = state.nodes[FakeState::index(parent)].screen;
            }
        }
        state.nodes.push(node);
        ElementHandle::new(state.nodes.len() as u64)
    }

    pub fn set_source(&self, source: &str) {
        self.state.lock().unwrap().source = source.to_string();
    }

    /// 接下来 `times` 次导航都落到 `to`
    pub fn redirect_navigations(&self, to: &str, times: usize) {
        let mut state = self.state.lock().unwrap();
        state.redirect_to = Some(to.to_string());
        state.redirects_left = times;
    }

    /// 第 `nth` 次读取地址时页面跳到 `to`（不经过导航）
    pub fn redirect_on_url_read(&self, nth: usize, to: &str) {
        self.state.lock().unwrap().redirect_on_read = Some((nth, to.to_string()));
    }

    pub fn current_url_now(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }

    pub fn screen(&self) -> usize {
        self.state.lock().unwrap().screen
    }

    pub fn reloads(&self) -> usize {
        self.state.lock().unwrap().reloads
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn clicks_on(&self, handle: ElementHandle) -> usize {
        self.clicks().into_iter().filter(|h| *h == handle).count()
    }

    pub fn typed(&self) -> Vec<(ElementHandle, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn selected(&self) -> Vec<(ElementHandle, String)> {
        self.state.lock().unwrap().selected.clone()
    }

    pub fn files(&self) -> Vec<(ElementHandle, PathBuf)> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn revealed(&self) -> Vec<ElementHandle> {
        self.state.lock().unwrap().revealed.clone()
    }

    pub fn scrolls(&self) -> Vec<u64> {
        self.state.lock().unwrap().scrolls.clone()
    }

    pub fn blurs(&self) -> usize {
        self.state.lock().unwrap().blurs
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        state.next_generation();
        if state.redirects_left > 0 {
            state.redirects_left -= 1;
            state.url = state.redirect_to.clone().unwrap_or_default();
        } else {
            state.url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.url_reads += 1;
        let reads = state.url_reads;
        if let Some((nth, to)) = state.redirect_on_read.clone() {
            if nth == reads {
                state.url = to;
                state.next_generation();
            }
        }
        Ok(state.url.clone())
    }

    async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.reloads += 1;
        state.next_generation();
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().source.clone())
    }

    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        matcher: &Matcher,
    ) -> Result<Vec<ElementHandle>> {
        let mut state = self.state.lock().unwrap();
        if let Some(scope) = scope {
            state.live(scope)?;
        }
        let key = matcher.expression();
        let found: Vec<ElementHandle> = state
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, node)| {
                node.keys.iter().any(|k| k == key)
                    && state.is_present(*i)
                    && scope.map_or(true, |s| state.is_descendant(*i, s))
            })
            .map(|(i, _)| ElementHandle::new(i as u64 + 1))
            .collect();
        let generation = state.generation;
        for handle in &found {
            state.issued.insert(*handle, generation);
        }
        Ok(found)
    }

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        Ok(self.state.lock().unwrap().live(element)?.parent)
    }

    async fn is_visible(&self, element: ElementHandle) -> Result<bool> {
        Ok(self.state.lock().unwrap().live(element)?.visible)
    }

    async fn is_clickable(&self, element: ElementHandle) -> Result<bool> {
        let state = self.state.lock().unwrap();
        let node = state.live(element)?;
        Ok(node.visible && node.clickable)
    }

    async fn click(&self, element: ElementHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let effect = state.live(element)?.on_click;
        state.clicks.push(element);
        match effect {
            ClickEffect::None => Ok(()),
            ClickEffect::ShowScreen(screen) => {
                state.screen = screen;
                Ok(())
            }
            ClickEffect::Fail => bail!("点击被拦截"),
        }
    }

    async fn type_text(&self, element: ElementHandle, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(element)?;
        state.typed.push((element, text.to_string()));
        Ok(())
    }

    async fn select_option(&self, element: ElementHandle, option_text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(element)?;
        state.selected.push((element, option_text.to_string()));
        Ok(())
    }

    async fn text(&self, element: ElementHandle) -> Result<String> {
        Ok(self.state.lock().unwrap().live(element)?.text.clone())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .live(element)?
            .attrs
            .get(name)
            .cloned())
    }

    async fn set_file(&self, element: ElementHandle, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(element)?;
        state.files.push((element, path.to_path_buf()));
        Ok(())
    }

    async fn reveal(&self, element: ElementHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.live(element)?;
        state.nodes[FakeState::index(element)].visible = true;
        state.revealed.push(element);
        Ok(())
    }

    async fn blur_active(&self) -> Result<()> {
        self.state.lock().unwrap().blurs += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        Ok(900)
    }

    async fn scroll_to(&self, y: u64) -> Result<()> {
        self.state.lock().unwrap().scrolls.push(y);
        Ok(())
    }
}

/// 固定答案的回答方，记录每次被询问的问题
#[derive(Debug, Default)]
pub struct FakeAnswerer {
    answers: HashMap<String, ResolvedAnswer>,
    asked: Mutex<Vec<String>>,
    job_title: Mutex<Option<String>>,
}

impl FakeAnswerer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, question: &str, answer: &str) -> Self {
        self.answers
            .insert(normalize_question(question), ResolvedAnswer::answered(answer));
        self
    }

    /// 只用于本次填写、不应写入答案库的答案
    pub fn one_off(mut self, question: &str, answer: &str) -> Self {
        self.answers
            .insert(normalize_question(question), ResolvedAnswer::one_off(answer));
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub fn job_title(&self) -> Option<String> {
        self.job_title.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionAnswerer for FakeAnswerer {
    async fn set_job(&self, job: &Job) {
        *self.job_title.lock().unwrap() = Some(job.title.clone());
    }

    async fn classify_upload_purpose(&self, label: &str) -> Result<UploadPurpose> {
        Ok(classify_upload_label(label))
    }

    async fn resolve_answer(
        &self,
        question: &str,
        kind: QuestionKind,
        options: &[String],
    ) -> Result<ResolvedAnswer> {
        self.asked.lock().unwrap().push(question.to_string());
        if let Some(answer) = self.answers.get(&normalize_question(question)) {
            return Ok(answer.clone());
        }
        Ok(match kind {
            QuestionKind::Choice => ResolvedAnswer::answered(
                options
                    .first()
                    .cloned()
                    .ok_or_else(|| anyhow!("没有可选项"))?,
            ),
            QuestionKind::Numeric => ResolvedAnswer::answered("3"),
            QuestionKind::Date => ResolvedAnswer::one_off("01/15/2025"),
            QuestionKind::Text => ResolvedAnswer::answered("Happy to discuss."),
        })
    }
}

/// 生成固定大小文档的生成器，可以先返回若干次限流
#[derive(Debug)]
pub struct FakeGenerator {
    size: usize,
    rate_limits_left: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            rate_limits_left: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rate_limited_times(self, times: usize) -> Self {
        self.rate_limits_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn produce(&self) -> Result<Vec<u8>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let limited = self
            .rate_limits_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            return Err(GenerationError::RateLimited {
                retry_after: Duration::from_millis(1),
            });
        }
        Ok(vec![b'%'; self.size])
    }
}

#[async_trait]
impl ArtifactGenerator for FakeGenerator {
    async fn generate_resume(&self, _job_description: &str) -> Result<Vec<u8>, GenerationError> {
        self.produce()
    }

    async fn generate_cover_letter(
        &self,
        _job_description: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        self.produce()
    }
}
